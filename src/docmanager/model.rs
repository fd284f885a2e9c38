use crate::error::{DocManagerError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const DOCBOOK_NS: &str = "http://docbook.org/ns/docbook";
pub const DOCMANAGER_NS: &str = "urn:x-suse:ns:docmanager";
pub const DOCMANAGER_PREFIX: &str = "dm";
pub const CONTAINER_NAME: &str = "docmanager";
pub const INFO_NAME: &str = "info";

/// Elements after which a missing `<info>` is inserted.
pub const TITLE_NAMES: &[&str] = &["title", "subtitle", "titleabbrev"];

pub const DEFAULT_PROPERTIES: &[&str] = &[
    "maintainer",
    "status",
    "deadline",
    "priority",
    "translation",
    "languages",
    "release",
    "repository",
];

pub const BUGTRACKER_PROPERTIES: &[&str] = &[
    "bugtracker/url",
    "bugtracker/component",
    "bugtracker/product",
    "bugtracker/assignee",
    "bugtracker/version",
];

pub const VALID_ROOTS: &[&str] = &[
    "abstract",
    "address",
    "annotation",
    "audiodata",
    "audioobject",
    "bibliodiv",
    "bibliography",
    "bibliolist",
    "blockquote",
    "book",
    "calloutlist",
    "caption",
    "caution",
    "chapter",
    "classsynopsis",
    "classsynopsisinfo",
    "cmdsynopsis",
    "components",
    "constraintdef",
    "constructorsynopsis",
    "destructorsynopsis",
    "epigraph",
    "equation",
    "example",
    "fieldsynopsis",
    "figure",
    "formalpara",
    "funcsynopsis",
    "funcsynopsisinfo",
    "glossary",
    "glossdiv",
    "glosslist",
    "imagedata",
    "imageobject",
    "imageobjectco",
    "important",
    "index",
    "indexdiv",
    "informalequation",
    "informalexample",
    "informalfigure",
    "informaltable",
    "inlinemediaobject",
    "itemizedlist",
    "legalnotice",
    "literallayout",
    "mediaobject",
    "methodsynopsis",
    "msg",
    "msgexplan",
    "msgmain",
    "msgrel",
    "msgset",
    "msgsub",
    "note",
    "orderedlist",
    "para",
    "part",
    "partintro",
    "personblurb",
    "procedure",
    "productionset",
    "programlisting",
    "programlistingco",
    "qandadiv",
    "qandaentry",
    "qandaset",
    "refentry",
    "refsect1",
    "refsect2",
    "refsect3",
    "refsection",
    "refsynopsisdiv",
    "revhistory",
    "screen",
    "screenco",
    "screenshot",
    "sect1",
    "sect2",
    "sect3",
    "sect4",
    "sect5",
    "section",
    "segmentedlist",
    "set",
    "setindex",
    "sidebar",
    "simpara",
    "simplelist",
    "simplesect",
    "step",
    "stepalternatives",
    "synopsis",
    "table",
    "task",
    "taskprerequisites",
    "taskrelated",
    "tasksummary",
    "textdata",
    "textobject",
    "tip",
    "toc",
    "tocdiv",
    "topic",
    "variablelist",
    "videodata",
    "videoobject",
    "warning",
];

static SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][-A-Za-z0-9._]*$").expect("segment pattern is valid")
});

/// A slash separated address of a property below the container, e.g. `bugtracker/url`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn leaf(&self) -> &str {
        // Construction guarantees at least one segment
        self.segments.last().map(String::as_str).unwrap_or_default()
    }
}

impl FromStr for PropertyPath {
    type Err = DocManagerError;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<String> = s
            .split('/')
            .map(str::trim)
            .filter(|seg| !seg.is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Err(DocManagerError::InvalidInput(format!(
                "Invalid property name {:?}",
                s
            )));
        }
        if let Some(bad) = segments.iter().find(|seg| !SEGMENT.is_match(seg)) {
            return Err(DocManagerError::InvalidInput(format!(
                "Invalid property name {:?}: segment {:?} is not an XML name",
                s, bad
            )));
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<PropertyPath> for String {
    fn from(path: PropertyPath) -> Self {
        path.to_string()
    }
}

/// Locale codes accepted in `languages`, sorted.
pub const LANGUAGE_CODES: &[&str] = &[
    "POSIX", "aa", "aa_DJ", "aa_ER", "aa_ET", "af", "af_ZA", "ak", "ak_GH", "am", "am_ET", "an",
    "an_ES", "anp", "anp_IN", "ar", "ar_AE", "ar_BH", "ar_DZ", "ar_EG", "ar_IN", "ar_IQ",
    "ar_JO", "ar_KW", "ar_LB", "ar_LY", "ar_MA", "ar_OM", "ar_QA", "ar_SA", "ar_SD", "ar_SS",
    "ar_SY", "ar_TN", "ar_YE", "as", "as_IN", "ast", "ast_ES", "ayc", "ayc_PE", "az", "az_AZ",
    "be", "be_BY", "bem", "bem_ZM", "ber", "ber_DZ", "ber_MA", "bg", "bg_BG", "bho", "bho_IN",
    "bn", "bn_BD", "bn_IN", "bo", "bo_CN", "bo_IN", "br", "br_FR", "brx", "brx_IN", "bs",
    "bs_BA", "byn", "byn_ER", "ca", "ca_AD", "ca_ES", "ca_FR", "ca_IT", "cmn", "cmn_TW", "crh",
    "crh_UA", "cs", "cs_CZ", "csb", "csb_PL", "cv", "cv_RU", "cy", "cy_GB", "da", "da_DK", "de",
    "de_AT", "de_BE", "de_CH", "de_DE", "de_LU", "doi", "doi_IN", "dv", "dv_MV", "dz", "dz_BT",
    "el", "el_CY", "el_GR", "en", "en_AG", "en_AU", "en_BE", "en_BW", "en_CA", "en_DK", "en_GB",
    "en_HK", "en_IE", "en_IN", "en_NG", "en_NZ", "en_PH", "en_SG", "en_US", "en_ZA", "en_ZM",
    "en_ZW", "es", "es_AR", "es_BO", "es_CL", "es_CO", "es_CR", "es_CU", "es_DO", "es_EC",
    "es_ES", "es_GT", "es_HN", "es_MX", "es_NI", "es_PA", "es_PE", "es_PR", "es_PY", "es_SV",
    "es_US", "es_UY", "es_VE", "et", "et_EE", "eu", "eu_ES", "fa", "fa_IR", "ff", "ff_SN", "fi",
    "fi_FI", "fil", "fil_PH", "fo", "fo_FO", "fr", "fr_BE", "fr_CA", "fr_CH", "fr_FR", "fr_LU",
    "fur", "fur_IT", "fy", "fy_DE", "fy_NL", "ga", "ga_IE", "gd", "gd_GB", "gez", "gez_ER",
    "gez_ET", "gl", "gl_ES", "gu", "gu_IN", "gv", "gv_GB", "ha", "ha_NG", "hak", "hak_TW", "he",
    "he_IL", "hi", "hi_IN", "hne", "hne_IN", "hr", "hr_HR", "hsb", "hsb_DE", "ht", "ht_HT",
    "hu", "hu_HU", "hy", "hy_AM", "ia", "ia_FR", "id", "id_ID", "ig", "ig_NG", "ik", "ik_CA",
    "is", "is_IS", "it", "it_CH", "it_IT", "iu", "iu_CA", "iw", "iw_IL", "ka", "ka_GE", "kk",
    "kk_KZ", "kl", "kl_GL", "km", "km_KH", "kn", "kn_IN", "kok", "kok_IN", "ks", "ks_IN", "ku",
    "ku_TR", "kw", "kw_GB", "ky", "ky_KG", "lb", "lb_LU", "lg", "lg_UG", "li", "li_BE", "li_NL",
    "lij", "lij_IT", "lo", "lo_LA", "lt", "lt_LT", "lv", "lv_LV", "lzh", "lzh_TW", "mag",
    "mag_IN", "mai", "mai_IN", "mg", "mg_MG", "mhr", "mhr_RU", "mi", "mi_NZ", "mk", "mk_MK",
    "ml", "ml_IN", "mn", "mn_MN", "mni", "mni_IN", "mr", "mr_IN", "ms", "ms_MY", "mt", "mt_MT",
    "my", "my_MM", "nan", "nan_TW", "nb", "nb_NO", "nds", "nds_DE", "nds_NL", "ne", "ne_NP",
    "nhn", "nhn_MX", "niu", "niu_NU", "niu_NZ", "nl", "nl_AW", "nl_BE", "nl_NL", "nn", "nn_NO",
    "no", "no_NO", "nr", "nr_ZA", "nso", "nso_ZA", "oc", "oc_FR", "om", "om_ET", "om_KE", "or",
    "or_IN", "os", "os_RU", "pa", "pa_IN", "pa_PK", "pap", "pap_AN", "pap_AW", "pap_CW", "pl",
    "pl_PL", "ps", "ps_AF", "pt", "pt_BR", "pt_PT", "quz", "quz_PE", "ro", "ro_RO", "ru",
    "ru_RU", "ru_UA", "rw", "rw_RW", "sa", "sa_IN", "sat", "sat_IN", "sc", "sc_IT", "sd",
    "sd_IN", "se", "se_NO", "sh", "sh_YU", "shs", "shs_CA", "si", "si_LK", "sid", "sid_ET",
    "sk", "sk_SK", "sl", "sl_SI", "so", "so_DJ", "so_ET", "so_KE", "so_SO", "sq", "sq_AL",
    "sq_MK", "sr", "sr_ME", "sr_RS", "ss", "ss_ZA", "st", "st_ZA", "sv", "sv_FI", "sv_SE", "sw",
    "sw_KE", "sw_TZ", "szl", "szl_PL", "ta", "ta_IN", "ta_LK", "te", "te_IN", "tg", "tg_TJ",
    "th", "th_TH", "the", "the_NP", "ti", "ti_ER", "ti_ET", "tig", "tig_ER", "tk", "tk_TM",
    "tl", "tl_PH", "tn", "tn_ZA", "tr", "tr_CY", "tr_TR", "ts", "ts_ZA", "tt", "tt_RU", "ug",
    "ug_CN", "uk", "uk_UA", "unm", "unm_US", "ur", "ur_IN", "ur_PK", "uz", "uz_UZ", "ve",
    "ve_ZA", "vi", "vi_VN", "wa", "wa_BE", "wae", "wae_CH", "wal", "wal_ET", "wo", "wo_SN",
    "xh", "xh_ZA", "yi", "yi_US", "yo", "yo_NG", "yue", "yue_HK", "zh", "zh_CN", "zh_HK",
    "zh_SG", "zh_TW", "zu", "zu_ZA",
];
