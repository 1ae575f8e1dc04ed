use std::fmt;

use pulldown_cmark_escape::{StrWrite, escape_href, escape_html, escape_html_body_text};

/// Append-only HTML sink used by the block and inline renderers.
#[derive(Debug, Default)]
pub(crate) struct HtmlWriter {
    out: String,
}

impl StrWrite for HtmlWriter {
    type Error = fmt::Error;

    #[inline]
    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.out.push_str(s);
        Ok(())
    }

    #[inline]
    fn write_fmt(&mut self, args: fmt::Arguments) -> Result<(), Self::Error> {
        fmt::Write::write_fmt(&mut self.out, args)
    }
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// Write pre-rendered markup as is.
    pub fn raw(&mut self, html: &str) -> fmt::Result {
        StrWrite::write_str(self, html)
    }

    pub fn text(&mut self, text: &str) -> fmt::Result {
        escape_html_body_text(&mut *self, text)
    }

    /// `<tag a="b">`. `href` and `src` values are URL-escaped, others
    /// attribute-escaped. Empty names are skipped so callers can pass
    /// optional attributes as `("", "")`.
    pub fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> fmt::Result {
        self.start_tag(tag, attrs)?;
        self.raw(">")
    }

    pub fn close(&mut self, tag: &str) -> fmt::Result {
        write!(self, "</{tag}>")
    }

    /// Element without content, e.g. `<br>` or `<img>`.
    pub fn void(&mut self, tag: &str, attrs: &[(&str, &str)]) -> fmt::Result {
        self.start_tag(tag, attrs)?;
        self.raw(">")
    }

    /// `<tag ...>text</tag>` in one call.
    pub fn element(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) -> fmt::Result {
        self.open(tag, attrs)?;
        self.text(text)?;
        self.close(tag)
    }

    fn start_tag(&mut self, tag: &str, attrs: &[(&str, &str)]) -> fmt::Result {
        write!(self, "<{tag}")?;
        for (name, value) in attrs {
            if name.is_empty() {
                continue;
            }
            write!(self, " {name}=\"")?;
            if matches!(*name, "href" | "src") {
                escape_href(&mut *self, value)?;
            } else {
                escape_html(&mut *self, value)?;
            }
            self.raw("\"")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_are_escaped() {
        let mut w = HtmlWriter::new();
        w.open("div", &[("title", "a \"quoted\" <b>"), ("", "skipped")])
            .unwrap();
        w.text("1 < 2 & 3").unwrap();
        w.close("div").unwrap();
        assert_eq!(
            w.into_string(),
            "<div title=\"a &quot;quoted&quot; &lt;b&gt;\">1 &lt; 2 &amp; 3</div>"
        );
    }

    #[test]
    fn test_href_is_url_escaped() {
        let mut w = HtmlWriter::new();
        w.void("img", &[("src", "http://x/a b\"c")]).unwrap();
        let html = w.into_string();
        assert!(html.starts_with("<img src=\"http://x/a%20b%22c\""));
    }
}
