//! Player page rendering.

/// Body of the 404 page for unknown or expired links.
pub const NOT_FOUND_PAGE: &str = "<!DOCTYPE html>
<html lang=\"en\">
<head><meta charset=\"utf-8\"><title>Not found</title></head>
<body><h1>404 - Video Not Found or Expired</h1></body>
</html>
";

/// Escape text for use in HTML element content and double-quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full-window player for a single stream.
pub fn player_page(file_name: &str, stream_url: &str, content_type: &str) -> String {
    let file_name = escape(file_name);
    let stream_url = escape(stream_url);
    let content_type = escape(content_type);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{file_name}</title>
<style>
  html, body {{ margin: 0; height: 100%; background: #000; color: #ddd; font-family: sans-serif; }}
  main {{ display: flex; flex-direction: column; height: 100%; }}
  video {{ flex: 1; width: 100%; min-height: 0; background: #000; }}
  footer {{ padding: 0.5rem 1rem; font-size: 0.9rem; display: flex; justify-content: space-between; }}
  a {{ color: #8ab4f8; }}
</style>
</head>
<body>
<main>
<video controls autoplay playsinline preload="metadata">
  <source src="{stream_url}" type="{content_type}">
</video>
<footer>
  <span>{file_name}</span>
  <a href="{stream_url}" download>Download</a>
</footer>
</main>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x")</script>&'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;&amp;&#39;"
        );
    }

    #[test]
    fn test_player_page_embeds_escaped_values() {
        let page = player_page(
            "a<b>.mp4",
            "http://localhost:8080/stream/tok",
            "video/mp4",
        );

        assert!(page.contains(r#"<source src="http://localhost:8080/stream/tok" type="video/mp4">"#));
        assert!(page.contains("a&lt;b&gt;.mp4"));
        assert!(!page.contains("a<b>.mp4"));
    }
}
