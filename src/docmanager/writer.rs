use crate::document::{element_depth, is_blank, observed_indent, Document, Splice, INDENT_UNIT};
use crate::entities;
use crate::envelope::start_tag_regex;
use crate::error::{DocManagerError, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use xot::{Node, Xot};

/// Comment text bracketing the spliced nodes while they are serialized.
const SPLICE_MARK: &str = "docmanager-splice";

impl Document {
    /// Serializes the document: header, original root start tag, body.
    ///
    /// Only the property container is re-indented and re-serialized; the
    /// rest of the body is copied from the source.
    pub fn to_xml_string(&mut self) -> Result<String> {
        self.reindent_container()?;
        let body = match self.splice.clone() {
            Some(splice) => self.spliced_body(&splice)?,
            None => self.serialized_body()?,
        };
        let decoded = entities::decode(&body);

        let mut out = String::with_capacity(self.envelope.header.len() + decoded.len());
        out.push_str(&self.envelope.header);
        out.push_str(&decoded);
        Ok(out)
    }

    /// The source body with `splice` serialized over its range.
    fn spliced_body(&mut self, splice: &Splice) -> Result<String> {
        let open = self.xot.new_comment(SPLICE_MARK);
        let close = self.xot.new_comment(SPLICE_MARK);
        self.xot.insert_before(splice.first, open)?;
        self.xot.insert_after(splice.last, close)?;
        let serialized = self.xot.to_string(self.root);
        self.xot.remove(open)?;
        self.xot.remove(close)?;
        let serialized = serialized?;

        let mark = format!("<!--{}-->", SPLICE_MARK);
        let fragment = serialized.split(mark.as_str()).nth(1).ok_or_else(|| {
            DocManagerError::Internal("serialized output lost the property container".into())
        })?;

        let range = splice.range.clone();
        let mut body = String::with_capacity(self.source.len() + fragment.len());
        body.push_str(&self.source[..range.start]);
        body.push_str(fragment);
        body.push_str(&self.source[range.end..]);
        Ok(body)
    }

    /// The root element as the tree library writes it, behind the original start tag.
    fn serialized_body(&self) -> Result<String> {
        let serialized = self.xot.to_string(self.root)?;

        let root_tag = &self.envelope.root_tag;
        let pattern = start_tag_regex(Some(root_tag))?;
        let regenerated = pattern.find(&serialized).ok_or_else(|| {
            DocManagerError::Internal(format!(
                "serialized output lost the <{}> start tag",
                root_tag
            ))
        })?;

        let markup = reconcile_root_markup(
            &self.envelope.root_markup,
            regenerated.as_str().ends_with("/>"),
        );
        let tail = self.source.get(self.tail..).unwrap_or_default();

        let mut body = String::with_capacity(serialized.len() + tail.len());
        body.push_str(&markup);
        body.push_str(&serialized[regenerated.end()..]);
        body.push_str(tail);
        Ok(body)
    }

    /// Writes the document back to the path it was loaded from.
    pub fn write(&mut self) -> Result<()> {
        let path = self
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| DocManagerError::Internal("document has no file path".into()))?;
        self.write_to(&path)
    }

    pub fn write_to(&mut self, path: &Path) -> Result<()> {
        let content = self.to_xml_string()?;
        fs::write(path, content).map_err(|e| DocManagerError::from_io(e, path))?;
        self.modified = false;
        info!(file = %path.display(), "wrote document");
        Ok(())
    }

    fn reindent_container(&mut self) -> Result<()> {
        let indent = observed_indent(&self.xot, self.container)
            .unwrap_or_else(|| INDENT_UNIT.repeat(element_depth(&self.xot, self.container)));
        reindent(&mut self.xot, self.container, &indent)?;
        debug!(indent = indent.len(), "re-indented property container");
        Ok(())
    }
}

/// Adjusts the original root start tag to the element's current shape.
fn reconcile_root_markup(original: &str, now_empty: bool) -> String {
    let was_empty = original.ends_with("/>");
    match (was_empty, now_empty) {
        (true, false) => format!("{}>", &original[..original.len() - 2]),
        (false, true) => format!("{}/>", &original[..original.len() - 1]),
        _ => original.to_string(),
    }
}

/// Lays out `node`'s child properties one per line, `INDENT_UNIT` deeper than `indent`.
///
/// Whitespace-only gaps are rewritten, gaps holding real text are kept.
fn reindent(xot: &mut Xot, node: Node, indent: &str) -> Result<()> {
    let children: Vec<Node> = xot.children(node).filter(|&n| xot.is_element(n)).collect();

    if children.is_empty() {
        let blanks: Vec<Node> = xot
            .children(node)
            .filter(|&n| {
                xot.text_str(n)
                    .map(|t| is_blank(t) && t.contains('\n'))
                    .unwrap_or(false)
            })
            .collect();
        for blank in blanks {
            xot.remove(blank)?;
        }
        return Ok(());
    }

    let inner = format!("{}{}", indent, INDENT_UNIT);
    let gap = format!("\n{}", inner);
    for &child in &children {
        set_gap_before(xot, child, &gap)?;
        reindent(xot, child, &inner)?;
    }
    if let Some(&last) = children.last() {
        set_gap_after(xot, node, last, &format!("\n{}", indent))?;
    }
    Ok(())
}

fn set_gap_before(xot: &mut Xot, node: Node, gap: &str) -> Result<()> {
    match xot.previous_sibling(node) {
        Some(prev) if xot.is_text(prev) => replace_blank(xot, prev, gap),
        _ => {
            let text = xot.new_text(gap);
            xot.insert_before(node, text)?;
            Ok(())
        }
    }
}

fn set_gap_after(xot: &mut Xot, parent: Node, node: Node, gap: &str) -> Result<()> {
    match xot.next_sibling(node) {
        Some(next) if xot.is_text(next) => replace_blank(xot, next, gap),
        _ => {
            let text = xot.new_text(gap);
            xot.append(parent, text)?;
            Ok(())
        }
    }
}

fn replace_blank(xot: &mut Xot, text_node: Node, gap: &str) -> Result<()> {
    let blank = xot.text_str(text_node).map(is_blank).unwrap_or(false);
    if blank {
        if let Some(text) = xot.text_mut(text_node) {
            text.set(gap);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyPath;

    const BOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE book [
  <!ENTITY product "Foo">
]>
<!-- a comment before the root -->
<book xmlns="http://docbook.org/ns/docbook"   version="5.0" xml:lang="en">
  <title>About &product;&#160;now</title>
  <info>
    <dm:docmanager xmlns:dm="urn:x-suse:ns:docmanager">
      <dm:maintainer>tux</dm:maintainer>
    </dm:docmanager>
    <abstract><para>Some text</para></abstract>
  </info>
  <chapter>
    <!-- keep me -->
    <para>Hello &product;</para>
  </chapter>
</book>
"#;

    fn p(s: &str) -> PropertyPath {
        s.parse().unwrap()
    }

    #[test]
    fn unmodified_document_round_trips() {
        let mut doc = Document::parse(BOOK).unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), BOOK);
        assert_eq!(doc.to_xml_string().unwrap(), BOOK);
    }

    #[test]
    fn mutation_only_touches_container() {
        let mut doc = Document::parse(BOOK).unwrap();
        doc.set(&p("status"), "edited").unwrap();
        doc.set(&p("bugtracker/url"), "https://bugs").unwrap();

        let expected = BOOK.replace(
            "      <dm:maintainer>tux</dm:maintainer>\n",
            concat!(
                "      <dm:maintainer>tux</dm:maintainer>\n",
                "      <dm:status>edited</dm:status>\n",
                "      <dm:bugtracker>\n",
                "        <dm:url>https://bugs</dm:url>\n",
                "      </dm:bugtracker>\n"
            ),
        );
        assert_eq!(doc.to_xml_string().unwrap(), expected);
    }

    #[test]
    fn deleting_everything_collapses_container() {
        let mut doc = Document::parse(BOOK).unwrap();
        doc.delete(&p("maintainer"), None).unwrap();
        let out = doc.to_xml_string().unwrap();
        assert!(out.contains("    <dm:docmanager xmlns:dm=\"urn:x-suse:ns:docmanager\"/>\n    <abstract>"), "{}", out);
    }

    #[test]
    fn self_closing_root_is_reopened() {
        let mut doc = Document::parse("<article xmlns=\"http://docbook.org/ns/docbook\"/>").unwrap();
        doc.set(&p("status"), "edited").unwrap();
        let out = doc.to_xml_string().unwrap();
        assert!(out.starts_with("<article xmlns=\"http://docbook.org/ns/docbook\">\n  <info>"), "{}", out);
        assert!(out.ends_with("</article>"), "{}", out);
        assert!(out.contains("<dm:status>edited</dm:status>"));
    }

    #[test]
    fn markup_outside_the_container_is_copied() {
        let text = concat!(
            "<article xmlns=\"http://docbook.org/ns/docbook\" role='x'>\n",
            "  <info>\n",
            "    <dm:docmanager xmlns:dm=\"urn:x-suse:ns:docmanager\">\n",
            "      <dm:status>edited</dm:status>\n",
            "    </dm:docmanager>\n",
            "  </info>\n",
            "  <screen><![CDATA[a < b && c]]></screen>\n",
            "  <para></para><para />\n",
            "  <para role='y'>&#x20AC; &amp; &lt;</para>\n",
            "</article>\n",
            "<!-- trailer -->\n"
        );
        let mut doc = Document::parse(text).unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), text);

        doc.set(&p("maintainer"), "tux").unwrap();
        let expected = text.replace(
            "      <dm:status>edited</dm:status>\n",
            "      <dm:status>edited</dm:status>\n      <dm:maintainer>tux</dm:maintainer>\n",
        );
        assert_eq!(doc.to_xml_string().unwrap(), expected);
    }

    #[test]
    fn added_container_leaves_the_rest_alone() {
        let text = concat!(
            "<book xmlns=\"http://docbook.org/ns/docbook\">\n",
            "  <title>T</title>\n",
            "  <screen><![CDATA[x < y]]></screen>\n",
            "</book>\n",
            "<!-- trailer -->\n"
        );
        let mut doc = Document::parse(text).unwrap();
        let expected = text.replace(
            "<title>T</title>\n",
            concat!(
                "<title>T</title>\n",
                "  <info>\n",
                "    <dm:docmanager xmlns:dm=\"urn:x-suse:ns:docmanager\"/>\n",
                "  </info>\n"
            ),
        );
        assert_eq!(doc.to_xml_string().unwrap(), expected);
    }

    #[test]
    fn reconcile_switches_between_open_and_empty() {
        assert_eq!(reconcile_root_markup("<book a='1' />", false), "<book a='1' >");
        assert_eq!(reconcile_root_markup("<book>", true), "<book/>");
        assert_eq!(reconcile_root_markup("<book>", false), "<book>");
    }

    #[test]
    fn write_to_file_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xml");
        std::fs::write(&path, BOOK).unwrap();

        let mut doc = Document::load(&path).unwrap();
        doc.set(&p("status"), "proofed").unwrap();
        doc.write().unwrap();
        assert!(!doc.is_modified());

        let reloaded = Document::load(&path).unwrap();
        assert_eq!(reloaded.get(&p("status")), Some("proofed".to_string()));
        assert_eq!(reloaded.get(&p("maintainer")), Some("tux".to_string()));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<!ENTITY product \"Foo\">"));
        assert!(text.contains("About &product;&#160;now"));
    }
}
