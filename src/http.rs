//! HTTP handling for the dashboard server
//!
//! Requests arrive as raw HTTP/1.1 text from the tokio accept loop in the
//! `server` binary; each one is answered with a complete response string.

use crate::cache::DatasetCache;
use crate::config::DashboardConfig;
use crate::dashboard::{selector_options, DashboardView};
use crate::error::DashboardError;
use crate::export::write_filtered_csv;
use crate::filter::FilterSelection;
use serde_json::json;
use tracing::{debug, error, warn};

const PAGE_TEMPLATE: &str = include_str!("page.html");

const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";
const CSV: &str = "text/csv; charset=utf-8";

/// Method, path and decoded query pairs of a request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl RequestLine {
    pub fn parse(request: &str) -> Option<Self> {
        let first = request.lines().next()?;
        let mut parts = first.split_whitespace();
        let method = parts.next()?.to_string();
        let target = parts.next()?;

        let (raw_path, raw_query) = match target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (target, ""),
        };

        // Normalize path (remove trailing slash except for root)
        let mut path = raw_path.trim_end_matches('/').to_string();
        if path.is_empty() {
            path = "/".to_string();
        }

        Some(Self {
            method,
            path,
            query: parse_query(raw_query),
        })
    }
}

/// Decode an `application/x-www-form-urlencoded` query; a key without `=`
/// gets an empty value
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

/// Route one raw request and produce the full response text
pub fn handle_request(request: &str, cache: &DatasetCache, config: &DashboardConfig) -> String {
    let Some(line) = RequestLine::parse(request) else {
        return create_response(400, "Bad Request", JSON, r#"{"error":"Malformed request line"}"#);
    };

    debug!("Request: {} {}", line.method, line.path);

    match (line.method.as_str(), line.path.as_str()) {
        ("OPTIONS", _) => create_response(204, "No Content", JSON, ""),
        ("GET", "/") => create_response(200, "OK", HTML, &render_page(&config.title)),
        ("GET", "/api/health") => {
            create_response(200, "OK", JSON, r#"{"status":"ok","service":"campaign-dashboard"}"#)
        }
        ("GET", "/api/options") => options_response(cache),
        ("GET", "/api/dashboard") => dashboard_response(&line, cache, config),
        ("GET", "/api/export") => export_response(&line, cache),
        ("POST", "/api/reload") => match cache.invalidate().and_then(|_| cache.get()) {
            Ok(dataset) => json_response(&json!({"reloaded": true, "rows": dataset.height()})),
            Err(e) => error_response(&e),
        },
        _ => create_response(404, "Not Found", JSON, r#"{"error":"Not found"}"#),
    }
}

fn options_response(cache: &DatasetCache) -> String {
    let result = cache.get().and_then(|dataset| {
        Ok(json!({
            "selectors": selector_options(&dataset)?,
            "rows": dataset.height(),
            "loaded_at": cache.loaded_at(),
        }))
    });
    match result {
        Ok(body) => json_response(&body),
        Err(e) => error_response(&e),
    }
}

fn dashboard_response(line: &RequestLine, cache: &DatasetCache, config: &DashboardConfig) -> String {
    let selection = match FilterSelection::from_pairs(line.query.iter().map(|(k, v)| (k.as_str(), v.as_str()))) {
        Ok(selection) => selection,
        Err(e) => return bad_request(&e),
    };

    let result = cache.get().and_then(|dataset| {
        DashboardView::build(&config.title, &dataset, &selection, config.table_row_limit)
    });
    match result {
        Ok(view) => match serde_json::to_value(&view) {
            Ok(body) => json_response(&body),
            Err(e) => error_response(&DashboardError::from(e)),
        },
        Err(e) => error_response(&e),
    }
}

fn export_response(line: &RequestLine, cache: &DatasetCache) -> String {
    let selection = match FilterSelection::from_pairs(line.query.iter().map(|(k, v)| (k.as_str(), v.as_str()))) {
        Ok(selection) => selection,
        Err(e) => return bad_request(&e),
    };

    let mut buf = Vec::new();
    let result = cache
        .get()
        .and_then(|dataset| write_filtered_csv(&dataset, &selection, &mut buf));
    match result {
        Ok(_) => create_response(200, "OK", CSV, &String::from_utf8_lossy(&buf)),
        Err(e) => error_response(&e),
    }
}

fn render_page(title: &str) -> String {
    PAGE_TEMPLATE.replace("{{title}}", &escape_html(title))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn json_response(body: &serde_json::Value) -> String {
    create_response(200, "OK", JSON, &body.to_string())
}

fn bad_request(err: &DashboardError) -> String {
    warn!("Rejected request: {}", err);
    create_response(400, "Bad Request", JSON, &json!({"error": err.to_string()}).to_string())
}

fn error_response(err: &DashboardError) -> String {
    error!("Request failed: {}", err);
    create_response(
        500,
        "Internal Server Error",
        JSON,
        &json!({"error": err.to_string()}).to_string(),
    )
}

pub fn create_response(status: u16, status_text: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        status,
        status_text,
        content_type,
        body.len(),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn body_of(response: &str) -> &str {
        response.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("")
    }

    fn scratch_report(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "campaign-dashboard-http-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.csv");
        fs::write(
            &path,
            "campaign_id,message_status,organization,whatsapp_phone_number\n\
             c1,sent,Org A,p1\n\
             c1,read,Org A,p1\n\
             c1,responded,orgB,p2\n\
             c1,invalid_user,Org A,p3\n",
        )
        .unwrap();
        path
    }

    fn decoded(raw: &str) -> String {
        parse_query(&format!("organization={}", raw))
            .pop()
            .map(|(_, v)| v)
            .unwrap()
    }

    #[test]
    fn test_query_values_are_form_decoded() {
        assert_eq!(decoded("Org%20A"), "Org A");
        assert_eq!(decoded("Org+A"), "Org A");
        assert_eq!(decoded("a%2Bb"), "a+b");
        assert_eq!(decoded("100%"), "100%");
        assert_eq!(decoded("%zz"), "%zz");
        assert_eq!(decoded("caf%C3%A9"), "café");
        assert_eq!(decoded("+"), " ");
    }

    #[test]
    fn test_query_keys_without_values() {
        assert_eq!(
            parse_query("campaign_id&&organization=orgA"),
            vec![
                ("campaign_id".to_string(), String::new()),
                ("organization".to_string(), "orgA".to_string()),
            ]
        );
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn test_request_line_parsing() {
        let line = RequestLine::parse("GET /api/dashboard/?organization=Org+A&campaign_id= HTTP/1.1\r\n\r\n")
            .unwrap();
        assert_eq!(line.method, "GET");
        assert_eq!(line.path, "/api/dashboard");
        assert_eq!(
            line.query,
            vec![
                ("organization".to_string(), "Org A".to_string()),
                ("campaign_id".to_string(), String::new()),
            ]
        );
        assert!(RequestLine::parse("").is_none());
    }

    #[test]
    fn test_dashboard_route_filters_by_query() {
        let path = scratch_report("dashboard");
        let cache = DatasetCache::new(&path);
        let config = DashboardConfig::default().with_data_path(path);

        let response = handle_request(
            "GET /api/dashboard?organization=Org%20A HTTP/1.1\r\nHost: localhost\r\n\r\n",
            &cache,
            &config,
        );
        assert!(response.starts_with("HTTP/1.1 200 OK"));

        let body: serde_json::Value = serde_json::from_str(body_of(&response)).unwrap();
        assert_eq!(body["counters"]["sent"], 3);
        assert_eq!(body["counters"]["learners"], 2);
        assert_eq!(body["counters"]["delivered"], 1);
        assert_eq!(body["selection"]["organization"], "Org A");
        assert_eq!(body["funnel"][3]["label"], "responded");
    }

    #[test]
    fn test_unknown_filter_key_is_bad_request() {
        let path = scratch_report("badkey");
        let cache = DatasetCache::new(&path);
        let config = DashboardConfig::default();

        let response = handle_request("GET /api/dashboard?channel=sms HTTP/1.1\r\n\r\n", &cache, &config);
        assert!(response.starts_with("HTTP/1.1 400"));
    }

    #[test]
    fn test_missing_report_is_server_error() {
        let cache = DatasetCache::new("/nonexistent/report.csv");
        let response = handle_request(
            "GET /api/options HTTP/1.1\r\n\r\n",
            &cache,
            &DashboardConfig::default(),
        );
        assert!(response.starts_with("HTTP/1.1 500"));
        assert!(body_of(&response).contains("error"));
    }

    #[test]
    fn test_page_and_not_found() {
        let cache = DatasetCache::new("/nonexistent/report.csv");
        let config = DashboardConfig::default();

        let page = handle_request("GET / HTTP/1.1\r\n\r\n", &cache, &config);
        assert!(page.contains("text/html"));
        assert!(page.contains("Campaign Performance"));
        assert!(!page.contains("{{title}}"));

        let missing = handle_request("GET /nope HTTP/1.1\r\n\r\n", &cache, &config);
        assert!(missing.starts_with("HTTP/1.1 404"));
    }

    #[test]
    fn test_export_route_returns_csv() {
        let path = scratch_report("export");
        let cache = DatasetCache::new(&path);

        let response = handle_request(
            "GET /api/export?message_status=responded HTTP/1.1\r\n\r\n",
            &cache,
            &DashboardConfig::default(),
        );
        assert!(response.contains("text/csv"));
        assert_eq!(
            body_of(&response),
            "campaign_id,message_status,organization,whatsapp_phone_number\nc1,responded,orgB,p2\n"
        );
    }
}
