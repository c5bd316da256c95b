use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break pattern compiles"));
static STYLE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*/?\s*(b|strong|i|em|s|strike|del|code|pre)(?:\s[^>]*)?>")
        .expect("style tag pattern compiles")
});

/// Rewrites the inline HTML bots commonly emit into WhatsApp markup.
///
/// Bold becomes `*`, italics `_`, strike-through `~`, code and preformatted blocks ```` ``` ````
/// and `<br>` a newline. Other markup is left untouched.
///
/// ```
/// use bb_core::markup::html_to_whatsapp;
///
/// assert_eq!(html_to_whatsapp("<b>bold</b>"), "*bold*");
/// assert_eq!(html_to_whatsapp("a<br/>b <em>c</em>"), "a\nb _c_");
/// ```
pub fn html_to_whatsapp(text: &str) -> String {
    let text = LINE_BREAK.replace_all(text, "\n");
    STYLE_TAG
        .replace_all(&text, |caps: &Captures<'_>| {
            match caps[1].to_ascii_lowercase().as_str() {
                "b" | "strong" => "*",
                "i" | "em" => "_",
                "s" | "strike" | "del" => "~",
                _ => "```",
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_style_tag() {
        assert_eq!(
            html_to_whatsapp("<strong>x</strong> <i>y</i> <del>z</del> <strike>w</strike> <s>v</s>"),
            "*x* _y_ ~z~ ~w~ ~v~"
        );
        assert_eq!(html_to_whatsapp("<pre>let a;</pre><code>b</code>"), "```let a;``````b```");
    }

    #[test]
    fn tolerates_case_and_attributes() {
        assert_eq!(html_to_whatsapp("<B class=\"x\">hi</B><BR>"), "*hi*\n");
    }

    #[test]
    fn leaves_unknown_tags_and_plain_text_alone() {
        assert_eq!(html_to_whatsapp("<span>keep</span> 2 < 3"), "<span>keep</span> 2 < 3");
        assert_eq!(html_to_whatsapp("<body>x</body>"), "<body>x</body>");
    }
}
