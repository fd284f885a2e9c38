use crate::commands::{CmdMessage, CmdResult, Context};
use crate::config::DocManagerConfig;
use crate::error::{DocManagerError, Result};

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(ctx: &Context, action: ConfigAction) -> Result<CmdResult> {
    match action {
        ConfigAction::ShowAll => Ok(CmdResult::default().with_config(ctx.config.clone())),
        ConfigAction::ShowKey(key) => {
            let value = ctx
                .config
                .get(&key)
                .ok_or(DocManagerError::ConfigKey(key))?;
            let mut result = CmdResult::default();
            result.add_message(CmdMessage::info(value));
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            let path = ctx.config_path.as_ref().ok_or_else(|| {
                DocManagerError::Internal("no location for the config file".to_string())
            })?;
            // Start from what is on disk so command line overrides are not persisted.
            let mut config = DocManagerConfig::load(path)?;
            config.set(&key, &value)?;
            config.save(path)?;

            let display_val = config.get(&key).unwrap_or(value);
            let mut result = CmdResult::default().with_config(config);
            result.add_message(CmdMessage::success(format!(
                "{} set to {}",
                key, display_val
            )));
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILENAME;

    fn context_in(dir: &std::path::Path) -> Context {
        let path = dir.join(CONFIG_FILENAME);
        Context::new(DocManagerConfig::load(&path).unwrap(), Some(path))
    }

    #[test]
    fn shows_all_values() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&context_in(dir.path()), ConfigAction::ShowAll).unwrap();
        assert_eq!(result.config, Some(DocManagerConfig::default()));
    }

    #[test]
    fn sets_and_persists_a_key() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(
            &context_in(dir.path()),
            ConfigAction::Set("queryformat".into(), "{os.file}".into()),
        )
        .unwrap();
        assert_eq!(result.messages[0].content, "queryformat set to {os.file}");

        let ctx = context_in(dir.path());
        let result = run(&ctx, ConfigAction::ShowKey("queryformat".into())).unwrap();
        assert_eq!(result.messages[0].content, "{os.file}");
    }

    #[test]
    fn unknown_keys_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        assert!(matches!(
            run(&ctx, ConfigAction::ShowKey("nope".into())),
            Err(DocManagerError::ConfigKey(_))
        ));
        assert!(matches!(
            run(&ctx, ConfigAction::Set("nope".into(), "1".into())),
            Err(DocManagerError::ConfigKey(_))
        ));
        assert!(!dir.path().join(CONFIG_FILENAME).exists());
    }
}
