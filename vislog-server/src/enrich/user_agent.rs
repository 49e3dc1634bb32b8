//! User-agent parsing
//!
//! Extracts a device model or type, an OS name + version and a browser
//! name + version. Unrecognised input degrades to `Desktop` with empty
//! OS and browser descriptors; parsing never fails.

use vislog_common::models::{DeviceInfo, DEFAULT_DEVICE};

/// Browser families, matched in order. Chrome must come after every
/// Chromium-based browser because they all carry a `Chrome/` token.
const BROWSERS: &[(&str, &[&str])] = &[
    ("Edge", &["EdgA/", "EdgiOS/", "Edg/", "Edge/"]),
    ("Opera", &["OPR/", "OPiOS/", "Opera/"]),
    ("Samsung Internet", &["SamsungBrowser/"]),
    ("Firefox", &["FxiOS/", "Firefox/"]),
    ("Chrome", &["CriOS/", "Chrome/"]),
];

const CONSOLE_MARKERS: &[&str] = &["PlayStation", "Xbox", "Nintendo"];
const TV_MARKERS: &[&str] = &["SmartTV", "SMART-TV", "AppleTV", "CrKey", "Web0S", "HbbTV"];

/// Parse a raw `User-Agent` header value
pub fn parse(user_agent: &str) -> DeviceInfo {
    let ua = user_agent.trim();
    if ua.is_empty() {
        return DeviceInfo::default();
    }

    DeviceInfo {
        device: detect_device(ua),
        os: describe(detect_os(ua)),
        browser: describe(detect_browser(ua)),
    }
}

fn describe(found: Option<(String, Option<String>)>) -> String {
    match found {
        Some((name, Some(version))) => format!("{} {}", name, version),
        Some((name, None)) => name,
        None => String::new(),
    }
}

/// Version token immediately following `marker`
fn version_after(ua: &str, marker: &str) -> Option<String> {
    let start = ua.find(marker)? + marker.len();
    let version: String = ua[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
        .collect();
    if version.is_empty() {
        None
    } else {
        Some(version)
    }
}

fn detect_browser(ua: &str) -> Option<(String, Option<String>)> {
    for (name, markers) in BROWSERS {
        for marker in *markers {
            if ua.contains(marker) {
                return Some((name.to_string(), version_after(ua, marker)));
            }
        }
    }

    if ua.contains("Safari/") && ua.contains("Version/") {
        let name = if ua.contains("Mobile/") { "Mobile Safari" } else { "Safari" };
        return Some((name.to_string(), version_after(ua, "Version/")));
    }

    if ua.contains("MSIE ") {
        return Some(("IE".to_string(), version_after(ua, "MSIE ")));
    }
    if ua.contains("Trident/") {
        return Some(("IE".to_string(), version_after(ua, "rv:")));
    }

    None
}

fn windows_release(nt_version: &str) -> String {
    match nt_version {
        "10.0" => "10",
        "6.3" => "8.1",
        "6.2" => "8",
        "6.1" => "7",
        "6.0" => "Vista",
        "5.1" | "5.2" => "XP",
        other => other,
    }
    .to_string()
}

fn detect_os(ua: &str) -> Option<(String, Option<String>)> {
    if ua.contains("Windows Phone") {
        return Some(("Windows Phone".to_string(), version_after(ua, "Windows Phone ")));
    }
    if let Some(nt) = version_after(ua, "Windows NT ") {
        return Some(("Windows".to_string(), Some(windows_release(&nt))));
    }
    if ua.contains("Windows") {
        return Some(("Windows".to_string(), None));
    }

    if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod") {
        let version = version_after(ua, "iPhone OS ")
            .or_else(|| version_after(ua, "CPU OS "))
            .map(|v| v.replace('_', "."));
        return Some(("iOS".to_string(), version));
    }

    if ua.contains("Mac OS X") {
        let version = version_after(ua, "Mac OS X ").map(|v| v.replace('_', "."));
        return Some(("macOS".to_string(), version));
    }

    if ua.contains("Android") {
        return Some(("Android".to_string(), version_after(ua, "Android ")));
    }

    if ua.contains("CrOS") {
        // "CrOS x86_64 14541.0.0": platform token, then version
        let version = ua
            .split("CrOS ")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().nth(1))
            .map(|v| v.trim_end_matches(')').to_string());
        return Some(("Chromium OS".to_string(), version));
    }

    if ua.contains("Linux") {
        return Some(("Linux".to_string(), None));
    }

    None
}

fn detect_device(ua: &str) -> String {
    if CONSOLE_MARKERS.iter().any(|m| ua.contains(m)) {
        return "Console".to_string();
    }
    if TV_MARKERS.iter().any(|m| ua.contains(m)) {
        return "SmartTV".to_string();
    }

    for model in ["iPhone", "iPad", "iPod"] {
        if ua.contains(model) {
            return model.to_string();
        }
    }

    if ua.contains("Android") {
        if let Some(model) = android_model(ua) {
            return model;
        }
        return if ua.contains("Mobile") { "Mobile" } else { "Tablet" }.to_string();
    }

    if ua.contains("Tablet") {
        return "Tablet".to_string();
    }
    if ua.contains("Mobile") || ua.contains("Mobi") {
        return "Mobile".to_string();
    }

    DEFAULT_DEVICE.to_string()
}

/// Model token from an Android platform group, e.g.
/// `(Linux; Android 13; SM-S908B)` or `(Linux; U; Android 4.0.3; ko-kr; LG-L160L Build/IML74K)`
fn android_model(ua: &str) -> Option<String> {
    let android_at = ua.find("Android")?;
    let open = ua[..android_at].rfind('(').map(|i| i + 1).unwrap_or(android_at);
    let close = ua[android_at..]
        .find(')')
        .map(|i| android_at + i)
        .unwrap_or(ua.len());

    let parts: Vec<&str> = ua[open..close].split(';').map(str::trim).collect();
    let android_idx = parts.iter().position(|p| p.starts_with("Android"))?;

    parts[android_idx + 1..]
        .iter()
        .copied()
        .map(|p| p.split(" Build/").next().unwrap_or(p).trim())
        .filter(|p| {
            !p.is_empty()
                && *p != "wv"
                && *p != "Mobile"
                && *p != "Tablet"
                && !p.starts_with("rv:")
                && !is_locale(p)
        })
        .last()
        .map(str::to_string)
}

/// `en-us`, `ko-KR`, `de`
fn is_locale(token: &str) -> bool {
    let mut pieces = token.split(['-', '_']);
    let lang = pieces.next().unwrap_or("");
    let region = pieces.next();
    lang.len() == 2
        && lang.chars().all(|c| c.is_ascii_lowercase())
        && region.map_or(true, |r| r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()))
        && pieces.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN10: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    #[test]
    fn test_chrome_on_windows_10() {
        let info = parse(CHROME_WIN10);
        assert_eq!(info.device, "Desktop");
        assert_eq!(info.os, "Windows 10");
        assert_eq!(info.browser, "Chrome 120.0.0.0");
    }

    #[test]
    fn test_edge_is_not_reported_as_chrome() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                  Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
        assert_eq!(parse(ua).browser, "Edge 120.0.2210.91");
    }

    #[test]
    fn test_safari_on_iphone() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1_2 like Mac OS X) AppleWebKit/605.1.15 \
                  (KHTML, like Gecko) Version/17.1.2 Mobile/15E148 Safari/604.1";
        let info = parse(ua);
        assert_eq!(info.device, "iPhone");
        assert_eq!(info.os, "iOS 17.1.2");
        assert_eq!(info.browser, "Mobile Safari 17.1.2");
    }

    #[test]
    fn test_ipad() {
        let ua = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 \
                  (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";
        let info = parse(ua);
        assert_eq!(info.device, "iPad");
        assert_eq!(info.os, "iOS 16.6");
    }

    #[test]
    fn test_safari_on_mac() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
                  (KHTML, like Gecko) Version/17.2 Safari/605.1.15";
        let info = parse(ua);
        assert_eq!(info.device, "Desktop");
        assert_eq!(info.os, "macOS 10.15.7");
        assert_eq!(info.browser, "Safari 17.2");
    }

    #[test]
    fn test_samsung_browser_on_android() {
        let ua = "Mozilla/5.0 (Linux; Android 13; SM-S908B) AppleWebKit/537.36 (KHTML, like Gecko) \
                  SamsungBrowser/23.0 Chrome/115.0.0.0 Mobile Safari/537.36";
        let info = parse(ua);
        assert_eq!(info.device, "SM-S908B");
        assert_eq!(info.os, "Android 13");
        assert_eq!(info.browser, "Samsung Internet 23.0");
    }

    #[test]
    fn test_android_legacy_layout_with_build_and_locale() {
        let ua = "Mozilla/5.0 (Linux; U; Android 4.0.3; ko-kr; LG-L160L Build/IML74K) \
                  AppleWebkit/534.30 (KHTML, like Gecko) Version/4.0 Mobile Safari/534.30";
        let info = parse(ua);
        assert_eq!(info.device, "LG-L160L");
        assert_eq!(info.os, "Android 4.0.3");
    }

    #[test]
    fn test_firefox_on_android_has_no_model() {
        let ua = "Mozilla/5.0 (Android 14; Mobile; rv:121.0) Gecko/121.0 Firefox/121.0";
        let info = parse(ua);
        assert_eq!(info.device, "Mobile");
        assert_eq!(info.os, "Android 14");
        assert_eq!(info.browser, "Firefox 121.0");
    }

    #[test]
    fn test_firefox_on_linux() {
        let ua = "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
        let info = parse(ua);
        assert_eq!(info.device, "Desktop");
        assert_eq!(info.os, "Linux");
        assert_eq!(info.browser, "Firefox 121.0");
    }

    #[test]
    fn test_chromebook() {
        let ua = "Mozilla/5.0 (X11; CrOS x86_64 14541.0.0) AppleWebKit/537.36 (KHTML, like Gecko) \
                  Chrome/120.0.0.0 Safari/537.36";
        assert_eq!(parse(ua).os, "Chromium OS 14541.0.0");
    }

    #[test]
    fn test_internet_explorer_11() {
        let ua = "Mozilla/5.0 (Windows NT 6.1; WOW64; Trident/7.0; rv:11.0) like Gecko";
        let info = parse(ua);
        assert_eq!(info.os, "Windows 7");
        assert_eq!(info.browser, "IE 11.0");
    }

    #[test]
    fn test_xbox_is_console() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64; Xbox; Xbox One) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edge/44.18363.8131";
        assert_eq!(parse(ua).device, "Console");
    }

    #[test]
    fn test_empty_and_malformed_degrade_to_defaults() {
        for ua in ["", "   ", "garbage", "!!!@@@###", "Mozilla/5.0"] {
            let info = parse(ua);
            assert_eq!(info.device, "Desktop", "ua = {:?}", ua);
            assert_eq!(info.os, "", "ua = {:?}", ua);
            assert_eq!(info.browser, "", "ua = {:?}", ua);
        }
    }

    #[test]
    fn test_name_without_version() {
        let info = parse("Mozilla/5.0 (Windows; rare build) Firefox/");
        assert_eq!(info.os, "Windows");
        assert_eq!(info.browser, "Firefox");
    }

    #[test]
    fn test_is_locale() {
        assert!(is_locale("en-us"));
        assert!(is_locale("ko-KR"));
        assert!(is_locale("de"));
        assert!(!is_locale("SM-S908B"));
        assert!(!is_locale("K"));
    }
}
