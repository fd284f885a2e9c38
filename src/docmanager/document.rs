//! A parsed DocBook5 document together with the envelope needed to write it
//! back without disturbing anything outside the property container.
//!
//! Loading runs the envelope locator, protects entity references, parses the
//! body with `xot`, validates the root element and finally makes sure the
//! `dm:docmanager` container exists as the first child of `<info>`.
//!
//! The protected body is kept as the document's source. Writing puts the
//! container back into that source at the byte range it was read from (or
//! at the spot it was added), so the rest of the body is written verbatim.

use crate::entities;
use crate::envelope::{self, Envelope};
use crate::error::{DocManagerError, Result};
use crate::model::{
    CONTAINER_NAME, DOCBOOK_NS, DOCMANAGER_NS, DOCMANAGER_PREFIX, INFO_NAME, TITLE_NAMES,
    VALID_ROOTS,
};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;
use xot::{NameId, NamespaceId, Node, PrefixId, SpanInfo, SpanInfoKey, Xot};

pub(crate) const INDENT_UNIT: &str = "  ";

/// Interned names used while walking and building the tree.
pub(crate) struct Names {
    pub docbook: NamespaceId,
    pub docmanager: NamespaceId,
    pub dm_prefix: PrefixId,
    pub info: NameId,
    pub container: NameId,
    pub titles: Vec<NameId>,
}

impl Names {
    fn intern(xot: &mut Xot) -> Self {
        let docbook = xot.add_namespace(DOCBOOK_NS);
        let docmanager = xot.add_namespace(DOCMANAGER_NS);
        let titles = TITLE_NAMES
            .iter()
            .map(|t| xot.add_name_ns(t, docbook))
            .collect();
        Self {
            docbook,
            docmanager,
            dm_prefix: xot.add_prefix(DOCMANAGER_PREFIX),
            info: xot.add_name_ns(INFO_NAME, docbook),
            container: xot.add_name_ns(CONTAINER_NAME, docmanager),
            titles,
        }
    }
}

/// Nodes the writer re-serializes into the source body.
#[derive(Debug, Clone)]
pub(crate) struct Splice {
    /// Source bytes the nodes take the place of; empty when they were added on load.
    pub range: Range<usize>,
    pub first: Node,
    pub last: Node,
}

pub struct Document {
    pub(crate) xot: Xot,
    pub(crate) root: Node,
    pub(crate) container: Node,
    pub(crate) names: Names,
    pub(crate) envelope: Envelope,
    /// Body with entity references protected, as parsed.
    pub(crate) source: String,
    pub(crate) splice: Option<Splice>,
    /// Offset of the first byte after the root element in `source`.
    pub(crate) tail: usize,
    pub(crate) modified: bool,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("root_tag", &self.envelope.root_tag)
            .field("modified", &self.modified)
            .finish()
    }
}

impl Document {
    /// Reads and parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(DocManagerError::InvalidInput(format!(
                "{} is a directory",
                path.display()
            )));
        }
        let text = fs::read_to_string(path).map_err(|e| DocManagerError::from_io(e, path))?;
        let mut document = Self::parse(&text)?;
        document.path = Some(path.to_path_buf());
        debug!(file = %path.display(), "loaded document");
        Ok(document)
    }

    /// Parses an in-memory document.
    pub fn parse(text: &str) -> Result<Self> {
        let envelope = envelope::locate(text)?;
        let body = envelope.body(text);

        let named = entities::encode(body);
        let source = entities::protect_char_refs(&named).into_owned();

        let mut xot = Xot::new();
        let (doc, spans) = xot
            .parse_with_span_info(&source)
            .map_err(|e| parse_error(&envelope.header, body, e.to_string()))?;
        let root = xot
            .document_element(doc)
            .map_err(|e| DocManagerError::Internal(e.to_string()))?;
        let names = Names::intern(&mut xot);

        check_root(&xot, root, &names)?;

        let added = ensure_container(&mut xot, root, &names)?;
        let container = find_container(&xot, root, &names)
            .ok_or_else(|| DocManagerError::Internal("property container vanished".into()))?;
        let splice = match added {
            Some(top) => {
                debug!(root = %envelope.root_tag, "created property container");
                added_splice(&xot, &spans, &source, top)
            }
            None => read_splice(&spans, &source, container),
        };
        if splice.is_none() {
            debug!("no place for the container in the source, serializing the whole body");
        }
        let tail = spans
            .get(SpanInfoKey::ElementEnd(root))
            .map(|span| span.end)
            .unwrap_or(source.len());

        Ok(Self {
            xot,
            root,
            container,
            names,
            envelope,
            source,
            splice,
            tail,
            modified: added.is_some(),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Whether the tree differs from what was read.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Local name of the root element.
    pub fn root_name(&self) -> &str {
        match self.xot.element(self.root) {
            Some(element) => self.xot.local_name_str(element.name()),
            None => "",
        }
    }
}

fn parse_error(header: &str, body: &str, message: String) -> DocManagerError {
    // xot errors carry no position; xmlparser gives a row and column for syntax errors
    let (line, column) = xmlparser::Tokenizer::from(body)
        .find_map(|token| token.err())
        .map(|err| {
            let pos = err.pos();
            file_position(header, pos.row, pos.col)
        })
        .unwrap_or((0, 0));
    DocManagerError::Parse {
        message,
        line,
        column,
    }
}

/// Turns a row and column inside the body into one inside the whole file.
fn file_position(header: &str, row: u32, col: u32) -> (u32, u32) {
    let header_rows = header.matches('\n').count() as u32;
    if row > 1 {
        return (row + header_rows, col);
    }
    let last_line = header.rsplit('\n').next().unwrap_or_default();
    (row + header_rows, col + last_line.chars().count() as u32)
}

fn find_container(xot: &Xot, root: Node, names: &Names) -> Option<Node> {
    xot.descendants(root)
        .find(|&n| has_name(xot, n, names.container))
}

/// The container's own markup in the source.
fn read_splice(spans: &SpanInfo, source: &str, container: Node) -> Option<Splice> {
    let start = spans.get(SpanInfoKey::ElementStart(container))?.start.checked_sub(1)?;
    let end = spans.get(SpanInfoKey::ElementEnd(container))?.end;
    if !source.get(start..)?.starts_with('<') {
        return None;
    }
    Some(Splice {
        range: start..end,
        first: container,
        last: container,
    })
}

/// Where the nodes added around `top` belong in the source.
///
/// Only whitespace and `top` itself are new; the neighbouring nodes that
/// came from the source fix the insertion point.
fn added_splice(xot: &Xot, spans: &SpanInfo, source: &str, top: Node) -> Option<Splice> {
    let is_new = |n: Node| xot.is_text(n) && spans.get(SpanInfoKey::Text(n)).is_none();
    let mut first = top;
    while let Some(prev) = xot.previous_sibling(first).filter(|&n| is_new(n)) {
        first = prev;
    }
    let mut last = top;
    while let Some(next) = xot.next_sibling(last).filter(|&n| is_new(n)) {
        last = next;
    }

    let at = match (xot.previous_sibling(first), xot.next_sibling(last)) {
        (Some(prev), _) => end_of(xot, spans, source, prev)?,
        (None, Some(next)) => start_of(xot, spans, source, next)?,
        (None, None) => {
            let parent = xot.parent(top)?;
            let span = spans.get(SpanInfoKey::ElementEnd(parent))?;
            // a self-closing parent has no room for children
            source
                .get(span.start..)?
                .starts_with("</")
                .then_some(span.start)?
        }
    };
    Some(Splice {
        range: at..at,
        first,
        last,
    })
}

fn end_of(xot: &Xot, spans: &SpanInfo, source: &str, node: Node) -> Option<usize> {
    if xot.is_element(node) {
        return spans.get(SpanInfoKey::ElementEnd(node)).map(|span| span.end);
    }
    if xot.is_comment(node) {
        return spans.get(SpanInfoKey::Comment(node)).map(|span| span.end + "-->".len());
    }
    text_span(xot, spans, source, node).map(|span| span.end)
}

fn start_of(xot: &Xot, spans: &SpanInfo, source: &str, node: Node) -> Option<usize> {
    if xot.is_element(node) {
        return spans.get(SpanInfoKey::ElementStart(node))?.start.checked_sub(1);
    }
    if xot.is_comment(node) {
        return spans.get(SpanInfoKey::Comment(node))?.start.checked_sub("<!--".len());
    }
    text_span(xot, spans, source, node).map(|span| span.start)
}

/// Span of a text node read in one piece; CDATA sections split the span.
fn text_span(xot: &Xot, spans: &SpanInfo, source: &str, node: Node) -> Option<Range<usize>> {
    let text = xot.text_str(node)?;
    let span = spans.get(SpanInfoKey::Text(node))?;
    (source.get(span.start..span.end) == Some(text)).then_some(span.start..span.end)
}

fn check_root(xot: &Xot, root: Node, names: &Names) -> Result<()> {
    let element = xot
        .element(root)
        .ok_or_else(|| DocManagerError::Internal("document element is not an element".into()))?;
    let name = element.name();
    let namespace = xot.namespace_for_name(name);
    if namespace != names.docbook {
        return Err(DocManagerError::NotTargetNamespace {
            found: xot.namespace_str(namespace).to_string(),
        });
    }
    let local = xot.local_name_str(name);
    if !VALID_ROOTS.contains(&local) {
        return Err(DocManagerError::InvalidRootElement(local.to_string()));
    }
    Ok(())
}

fn has_name(xot: &Xot, node: Node, name: NameId) -> bool {
    xot.element(node).map(|e| e.name()) == Some(name)
}

/// Finds the container anywhere in the tree or creates it under `<info>`.
///
/// Returns the topmost element added, if any: the container or a new `<info>`.
fn ensure_container(xot: &mut Xot, root: Node, names: &Names) -> Result<Option<Node>> {
    if find_container(xot, root, names).is_some() {
        return Ok(None);
    }

    let existing = xot.children(root).find(|&n| has_name(xot, n, names.info));
    let (info, top) = match existing {
        Some(info) => (info, None),
        None => {
            let info = insert_info(xot, root, names)?;
            (info, Some(info))
        }
    };

    let container = xot.new_element(names.container);
    if !namespace_in_scope(xot, info, names.docmanager) {
        xot.namespaces_mut(container)
            .insert(names.dm_prefix, names.docmanager);
    }
    xot.prepend(info, container)?;
    indent_new_child(xot, info, container)?;
    Ok(Some(top.unwrap_or(container)))
}

fn insert_info(xot: &mut Xot, root: Node, names: &Names) -> Result<Node> {
    let anchor = xot
        .children(root)
        .filter(|&n| {
            xot.element(n)
                .map(|e| names.titles.contains(&e.name()))
                .unwrap_or(false)
        })
        .last();

    let info = xot.new_element(names.info);
    match anchor {
        Some(title) => xot.insert_after(title, info)?,
        None => xot.prepend(root, info)?,
    }
    indent_new_child(xot, root, info)?;
    Ok(info)
}

fn namespace_in_scope(xot: &Xot, node: Node, namespace: NamespaceId) -> bool {
    std::iter::successors(Some(node), |&n| xot.parent(n))
        .filter(|&n| xot.is_element(n))
        .any(|n| xot.namespaces(n).iter().any(|(_, ns)| *ns == namespace))
}

pub(crate) fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Number of element ancestors of `node`; the root element has depth 0.
pub(crate) fn element_depth(xot: &Xot, node: Node) -> usize {
    std::iter::successors(xot.parent(node), |&n| xot.parent(n))
        .filter(|&n| xot.is_element(n))
        .count()
}

/// Indentation found on the line of `node`, if the whitespace before it shows one.
pub(crate) fn observed_indent(xot: &Xot, node: Node) -> Option<String> {
    let prev = xot.previous_sibling(node)?;
    let text = xot.text_str(prev)?;
    if !is_blank(text) {
        return None;
    }
    text.rfind('\n').map(|i| text[i + 1..].to_string())
}

/// Surrounds a freshly inserted child with whitespace that fits its siblings.
///
/// Parents written without any line breaks are left compact.
fn indent_new_child(xot: &mut Xot, parent: Node, child: Node) -> Result<()> {
    let siblings: Vec<Node> = xot
        .children(parent)
        .filter(|&n| n != child && xot.is_element(n))
        .collect();
    let has_breaks = xot
        .children(parent)
        .any(|n| xot.text_str(n).map(|t| t.contains('\n')).unwrap_or(false));
    if !siblings.is_empty() && !has_breaks {
        return Ok(());
    }

    let parent_indent = observed_indent(xot, parent)
        .unwrap_or_else(|| INDENT_UNIT.repeat(element_depth(xot, parent)));
    let indent = siblings
        .iter()
        .find_map(|&s| observed_indent(xot, s))
        .unwrap_or_else(|| format!("{}{}", parent_indent, INDENT_UNIT));

    let before_is_text = xot
        .previous_sibling(child)
        .map(|n| xot.is_text(n))
        .unwrap_or(false);
    if !before_is_text {
        let ws = xot.new_text(&format!("\n{}", indent));
        xot.insert_before(child, ws)?;
    }

    match xot.next_sibling(child) {
        None => {
            let ws = xot.new_text(&format!("\n{}", parent_indent));
            xot.append(parent, ws)?;
        }
        Some(next) if xot.is_element(next) => {
            let ws = xot.new_text(&format!("\n{}", indent));
            xot.insert_after(child, ws)?;
        }
        Some(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = r#"<book xmlns="http://docbook.org/ns/docbook" version="5.0">
  <title>Test</title>
  <chapter>
    <para>Hello</para>
  </chapter>
</book>
"#;

    #[test]
    fn creates_info_after_title() {
        let mut doc = Document::parse(BOOK).unwrap();
        assert!(doc.is_modified());
        let out = doc.to_xml_string().unwrap();
        assert!(out.contains(
            "<title>Test</title>\n  <info>\n    <dm:docmanager xmlns:dm=\"urn:x-suse:ns:docmanager\"/>\n  </info>\n  <chapter>"
        ), "{}", out);
    }

    #[test]
    fn creates_info_first_without_titles() {
        let mut doc = Document::parse(
            "<article xmlns=\"http://docbook.org/ns/docbook\">\n  <para>x</para>\n</article>",
        )
        .unwrap();
        let out = doc.to_xml_string().unwrap();
        assert!(out.starts_with(
            "<article xmlns=\"http://docbook.org/ns/docbook\">\n  <info>\n    <dm:docmanager"
        ), "{}", out);
    }

    #[test]
    fn reuses_existing_container() {
        let text = r#"<book xmlns="http://docbook.org/ns/docbook" xmlns:dm="urn:x-suse:ns:docmanager">
  <info>
    <dm:docmanager>
      <dm:status>edited</dm:status>
    </dm:docmanager>
  </info>
</book>"#;
        let mut doc = Document::parse(text).unwrap();
        assert!(!doc.is_modified());
        assert_eq!(doc.to_xml_string().unwrap(), text);
    }

    #[test]
    fn rejects_foreign_namespace() {
        let err = Document::parse("<book><title>x</title></book>").unwrap_err();
        assert!(matches!(err, DocManagerError::NotTargetNamespace { .. }));
    }

    #[test]
    fn rejects_invalid_root() {
        let err =
            Document::parse("<foo xmlns=\"http://docbook.org/ns/docbook\"/>").unwrap_err();
        match err {
            DocManagerError::InvalidRootElement(name) => assert_eq!(name, "foo"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parse_errors_carry_a_position() {
        let err = Document::parse(
            "<book xmlns=\"http://docbook.org/ns/docbook\">\n  <para role=x/>\n</book>",
        )
        .unwrap_err();
        match err {
            DocManagerError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parse_error_lines_count_the_prolog() {
        let text = concat!(
            "<?xml version=\"1.0\"?>\n",
            "<!DOCTYPE book>\n",
            "<!-- c -->\n",
            "<book xmlns=\"http://docbook.org/ns/docbook\">\n",
            "  <para role=x/>\n",
            "</book>"
        );
        match Document::parse(text).unwrap_err() {
            DocManagerError::Parse { line, .. } => assert_eq!(line, 5),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn positions_on_the_root_line_shift_by_the_header() {
        assert_eq!(file_position("<?xml?>\n<!-- c --> ", 1, 3), (2, 14));
        assert_eq!(file_position("<?xml?>\n", 1, 3), (2, 3));
        assert_eq!(file_position("<?xml?>\n", 2, 7), (3, 7));
        assert_eq!(file_position("", 4, 2), (4, 2));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Document::load("/definitely/not/here.xml").unwrap_err();
        assert!(matches!(err, DocManagerError::FileNotFound(_)));
    }
}
