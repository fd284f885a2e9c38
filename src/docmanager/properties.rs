//! Path-addressed properties inside the `dm:docmanager` container.
//!
//! Every path segment maps to one element in the docmanager namespace. A
//! property's value is the direct text of its element; intermediate segments
//! created on the way to a leaf carry no text. Deleting a leaf never prunes
//! the intermediates above it, so attributes placed on them survive.

use crate::document::{is_blank, Document};
use crate::entities;
use crate::error::{DocManagerError, Result};
use crate::model::{PropertyPath, BUGTRACKER_PROPERTIES, DEFAULT_PROPERTIES};
use tracing::{debug, trace};
use xot::Node;

impl Document {
    /// Resolves `path` to its element, walking segments from the container.
    fn find(&self, path: &PropertyPath) -> Option<Node> {
        let ns = self.names.docmanager;
        path.segments().iter().try_fold(self.container, |node, segment| {
            let name = self.xot.name_ns(segment, ns)?;
            self.xot
                .children(node)
                .find(|&child| self.xot.element(child).map(|e| e.name()) == Some(name))
        })
    }

    /// Text value of a property element.
    ///
    /// A node that only holds child properties (and whitespace) has no value.
    fn value_of(&self, node: Node) -> Option<String> {
        let mut has_children = false;
        let mut text = String::new();
        for child in self.xot.children(node) {
            if self.xot.is_element(child) {
                has_children = true;
            } else if let Some(t) = self.xot.text_str(child) {
                text.push_str(t);
            }
        }
        if has_children && is_blank(&text) {
            None
        } else {
            Some(entities::resolve(&text).into_owned())
        }
    }

    pub fn get(&self, path: &PropertyPath) -> Option<String> {
        self.find(path).and_then(|node| self.value_of(node))
    }

    /// Values for the requested paths, in request order; missing paths map to `None`.
    pub fn get_selected(&self, paths: &[PropertyPath]) -> Vec<(PropertyPath, Option<String>)> {
        let mut result: Vec<(PropertyPath, Option<String>)> = Vec::with_capacity(paths.len());
        for path in paths {
            if result.iter().any(|(p, _)| p == path) {
                continue;
            }
            result.push((path.clone(), self.get(path)));
        }
        result
    }

    /// Every direct, non-hierarchical property of the container keyed by local name.
    pub fn get_all(&self) -> Vec<(String, String)> {
        self.xot
            .children(self.container)
            .filter(|&child| self.xot.is_element(child))
            .filter(|&child| !self.xot.children(child).any(|n| self.xot.is_element(n)))
            .filter_map(|child| {
                let name = self.xot.element(child)?.name();
                let value = self.value_of(child)?;
                Some((self.xot.local_name_str(name).to_string(), value))
            })
            .collect()
    }

    pub fn exists(&self, path: &PropertyPath) -> bool {
        self.find(path).is_some()
    }

    /// Sets the text of the leaf at `path`, creating missing segments.
    pub fn set(&mut self, path: &PropertyPath, value: &str) -> Result<()> {
        let ns = self.names.docmanager;
        let mut node = self.container;
        for segment in path.segments() {
            let name = self.xot.add_name_ns(segment, ns);
            let existing = self
                .xot
                .children(node)
                .find(|&child| self.xot.element(child).map(|e| e.name()) == Some(name));
            node = match existing {
                Some(child) => child,
                None => {
                    let child = self.xot.new_element(name);
                    self.xot.append(node, child)?;
                    trace!(segment = %segment, "created property element");
                    child
                }
            };
        }
        self.set_text(node, value)?;
        self.modified = true;
        debug!(property = %path, value = %value, "set property");
        Ok(())
    }

    pub fn set_many(&mut self, pairs: &[(PropertyPath, String)]) -> Result<()> {
        for (path, value) in pairs {
            self.set(path, value)?;
        }
        Ok(())
    }

    fn set_text(&mut self, node: Node, value: &str) -> Result<()> {
        let has_children = self.xot.children(node).any(|n| self.xot.is_element(n));
        if has_children {
            // Only the text in front of the first child property is the value
            if let Some(first) = self.xot.first_child(node) {
                if self.xot.is_text(first) {
                    self.xot.remove(first)?;
                }
            }
            if !value.is_empty() {
                let text = self.xot.new_text(value);
                self.xot.prepend(node, text)?;
            }
        } else {
            let texts: Vec<Node> = self.xot.children(node).collect();
            for text in texts {
                self.xot.remove(text)?;
            }
            if !value.is_empty() {
                self.xot.append_text(node, value)?;
            }
        }
        Ok(())
    }

    /// Removes the property at `path`.
    ///
    /// With a `condition`, the property is only removed when its current value
    /// equals it. Returns whether something was removed.
    pub fn delete(&mut self, path: &PropertyPath, condition: Option<&str>) -> Result<bool> {
        let node = match self.find(path) {
            Some(node) => node,
            None => return Ok(false),
        };
        if let Some(expected) = condition {
            if self.value_of(node).as_deref() != Some(expected) {
                debug!(property = %path, "value differs from condition, not deleting");
                return Ok(false);
            }
        }
        self.xot.remove(node)?;
        self.modified = true;
        debug!(property = %path, "deleted property");
        Ok(true)
    }

    fn require(&self, path: &PropertyPath) -> Result<Node> {
        self.find(path)
            .ok_or_else(|| DocManagerError::PropertyNotFound(path.to_string()))
    }

    /// Merges `attrs` onto the property element at `path`.
    pub fn set_attrs(&mut self, path: &PropertyPath, attrs: &[(String, String)]) -> Result<()> {
        let node = self.require(path)?;
        for (name, value) in attrs {
            let name_id = self.xot.add_name(name);
            self.xot.attributes_mut(node).insert(name_id, value.clone());
        }
        self.modified = true;
        Ok(())
    }

    /// Removes the named attributes; returns the names that were not present.
    pub fn del_attrs(&mut self, path: &PropertyPath, names: &[String]) -> Result<Vec<String>> {
        let node = self.require(path)?;
        let mut missing = Vec::new();
        for name in names {
            let removed = match self.xot.name(name) {
                Some(name_id) => self.xot.attributes_mut(node).remove(name_id).is_some(),
                None => false,
            };
            if removed {
                self.modified = true;
            } else {
                missing.push(name.clone());
            }
        }
        Ok(missing)
    }

    /// Attributes of the property at `path` in document order.
    pub fn get_attrs(&self, path: &PropertyPath) -> Result<Vec<(String, String)>> {
        let node = self.require(path)?;
        Ok(self
            .xot
            .attributes(node)
            .iter()
            .map(|(name, value)| {
                (
                    self.xot.local_name_str(name).to_string(),
                    entities::resolve(value).into_owned(),
                )
            })
            .collect())
    }

    /// Paths of all property elements below the container, depth first.
    pub fn property_paths(&self) -> Vec<PropertyPath> {
        let mut result = Vec::new();
        let mut stack: Vec<(Node, String)> = vec![(self.container, String::new())];
        while let Some((node, prefix)) = stack.pop() {
            let children: Vec<Node> = self
                .xot
                .children(node)
                .filter(|&n| self.xot.is_element(n))
                .collect();
            for child in children.into_iter().rev() {
                let Some(element) = self.xot.element(child) else {
                    continue;
                };
                let local = self.xot.local_name_str(element.name());
                let full = if prefix.is_empty() {
                    local.to_string()
                } else {
                    format!("{}/{}", prefix, local)
                };
                stack.push((child, full));
            }
            if !prefix.is_empty() {
                if let Ok(path) = prefix.parse() {
                    result.push(path);
                }
            }
        }
        result
    }

    pub fn is_set(&self, path: &PropertyPath, allowed: &[&str]) -> bool {
        match self.get(path) {
            Some(value) => allowed.contains(&value.as_str()),
            None => false,
        }
    }

    /// Creates the default properties with empty values.
    ///
    /// Properties already present are left alone and counted, unless `force`
    /// is set, in which case they are reset to empty.
    pub fn init_defaults(&mut self, force: bool, with_bugtracker: bool) -> Result<usize> {
        let mut names: Vec<&str> = DEFAULT_PROPERTIES.to_vec();
        if with_bugtracker {
            names.extend_from_slice(BUGTRACKER_PROPERTIES);
        }

        let mut skipped = 0;
        for name in names {
            let path: PropertyPath = name.parse()?;
            if self.exists(&path) && !force {
                skipped += 1;
                continue;
            }
            self.set(&path, "")?;
        }
        Ok(skipped)
    }
}
