//! RSS 2.0 feed for the meetup listing.

use chrono::{DateTime, Utc};

use crate::meetup::{Meetup, parse_instant};

const CHANNEL_TITLE: &str = "Icelandic Tech Meetups";
const CHANNEL_DESCRIPTION: &str = "List of Icelandic tech meetups and community groups from apis.is";
const CHANNEL_LINK: &str = "https://apis.is/x/meetups";
const SELF_LINK: &str = "https://apis.is/x/meetups?format=rss";
const NO_DESCRIPTION: &str = "No description available.";

/// Renders `items` as an RSS 2.0 document built at `now`.
///
/// A meetup whose start time does not parse is still listed, without a
/// `<pubDate>`.
pub fn render(items: &[Meetup], now: DateTime<Utc>) -> String {
    let mut out = String::with_capacity(512 + items.len() * 384);

    out.push_str(&format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">
  <channel>
    <title>{CHANNEL_TITLE}</title>
    <description>{CHANNEL_DESCRIPTION}</description>
    <link>{CHANNEL_LINK}</link>
    <atom:link href=\"{SELF_LINK}\" rel=\"self\" type=\"application/rss+xml\" />
    <lastBuildDate>{}</lastBuildDate>
    <language>is</language>
",
        http_date(now),
    ));

    for item in items {
        out.push_str(&render_item(item));
    }

    out.push_str("  </channel>\n</rss>");
    out
}

fn render_item(item: &Meetup) -> String {
    let description = item.description.as_deref().unwrap_or(NO_DESCRIPTION);
    let link = escape_xml(&item.url);
    let pub_date = parse_instant(&item.data.start)
        .map(|start| format!("      <pubDate>{}</pubDate>\n", http_date(start)))
        .unwrap_or_default();

    format!(
        "    <item>
      <title>{}</title>
      <description>{}</description>
      <link>{link}</link>
      <guid isPermaLink=\"true\">{link}</guid>
{pub_date}    </item>
",
        escape_xml(&item.title),
        escape_xml(description),
    )
}

/// `Tue, 05 Nov 2026 18:00:00 GMT`
fn http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meetup::Schedule;
    use chrono::TimeZone;

    fn meetup(title: &str, description: Option<&str>, start: &str) -> Meetup {
        Meetup {
            title: title.into(),
            description: description.map(Into::into),
            url: "https://example.is/?a=1&b=2".into(),
            data: Schedule { start: start.into(), end: None },
        }
    }

    #[test]
    fn escapes_all_five_entities() {
        assert_eq!(escape_xml(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;");
    }

    #[test]
    fn renders_channel_header() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let xml = render(&[], now);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\""));
        assert!(xml.contains("<title>Icelandic Tech Meetups</title>"));
        assert!(xml.contains("<lastBuildDate>Fri, 16 Oct 2026 12:00:00 GMT</lastBuildDate>"));
        assert!(xml.contains("<language>is</language>"));
        assert!(!xml.contains("<item>"));
        assert!(xml.ends_with("</channel>\n</rss>"));
    }

    #[test]
    fn renders_items_with_defaults_and_escaping() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let xml = render(
            &[
                meetup("Rust & Friends", None, "2026-11-05T18:00:00Z"),
                meetup("Undated", Some("<b>bold</b>"), "soon"),
            ],
            now,
        );

        assert_eq!(xml.matches("<item>").count(), 2);
        assert!(xml.contains("<title>Rust &amp; Friends</title>"));
        assert!(xml.contains("<description>No description available.</description>"));
        assert!(xml.contains("<description>&lt;b&gt;bold&lt;/b&gt;</description>"));
        assert!(xml.contains("<guid isPermaLink=\"true\">https://example.is/?a=1&amp;b=2</guid>"));
        assert!(xml.contains("<pubDate>Thu, 05 Nov 2026 18:00:00 GMT</pubDate>"));
        assert_eq!(xml.matches("<pubDate>").count(), 1);
    }
}
