//! `sample.html`: one line per written instance, set in that instance.

use font_instancer::InstanceNames;

pub const FILE_NAME: &str = "sample.html";

const HEADER: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
  .example {
    font-size: 20px;
    margin-bottom: 16px;
  }
  </style>
</head>
<body>
"#;

const FOOTER: &str = "</body>\n</html>\n";

/// Escape text for use inside HTML content or a quoted attribute.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// CSS string contents: quotes and backslashes are escaped before the whole
/// value is HTML escaped.
fn css_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

pub fn page<'a>(instances: impl IntoIterator<Item = &'a InstanceNames>) -> String {
    let mut html = String::from(HEADER);
    for names in instances {
        let full = names.full_name();
        let family = format!("'{}', '{}'", css_string(&full), css_string(&names.postscript));
        html.push_str(&format!(
            "  <div class=\"example\" style=\"font-family: {}\">{}</div>\n",
            escape(&family),
            escape(&full)
        ));
    }
    html.push_str(FOOTER);
    html
}
