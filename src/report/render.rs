// src/report/render.rs
// =============================================================================
// Text renderings of a PageReport.
//
// Both flavors carry the same data in the same order:
//   1. measurements recap (+ server response time, + PageSpeed block)
//   2. grade banner
//   3. weight per resource type (non-zero buckets only)
//   4. resources, heaviest first
//
// The Html flavor wraps the banner in a colored span and each resource in an
// anchor; everything else is identical so the page can show it preformatted.
// =============================================================================

use std::fmt::Write;
use url::Url;

use super::{bytes_to_kb, bytes_to_mb, PageReport, Rendering};
use crate::pagespeed::PerformanceSummary;
use crate::score::Grade;

const RULE: &str = "-------------------------------------------";
const SHORT_RULE: &str = "----------------------------------------";

pub fn render(report: &PageReport, rendering: Rendering) -> String {
    let mut out = String::new();

    out.push_str(&measurements(report));
    out.push('\n');
    if let Some(secs) = report.server_response_time_secs.filter(|s| *s > 0.0) {
        let _ = write!(out, "- Server response time: {:.3}s", secs);
    }
    out.push('\n');

    if let Some(performance) = &report.performance {
        out.push_str(&performance_block(performance));
    }

    let (open, close) = match rendering {
        Rendering::Plain => (String::new(), ""),
        Rendering::Html => (
            format!("<span class=\"pt-2 {}\">", grade_class(report.grade)),
            "</span>",
        ),
    };
    let _ = writeln!(out, "{}{}", open, RULE);
    let _ = writeln!(out, "Sobriety grade: {}", report.grade);
    let _ = writeln!(out, "{}{}", RULE, close);

    out.push_str(&weight_by_type(report));
    out.push_str(&resource_list(report, rendering));

    out
}

fn measurements(report: &PageReport) -> String {
    let m = &report.metrics;
    format!(
        "{RULE}\nMeasurements\n{RULE}\n\
         - DOM elements: {}\n\
         - Max node depth: {}\n\
         - Total page weight: {}MB\n\
         - HTTP requests: {}",
        m.dom_elements,
        m.max_depth,
        format_number(m.total_weight_mb()),
        m.total_requests,
    )
}

fn performance_block(performance: &PerformanceSummary) -> String {
    let mut out = String::new();

    if let Some(load_time) = performance.load_time() {
        let _ = writeln!(out, "- Page load time: {}", load_time);
    }
    let strategies = [
        ("desktop", &performance.desktop),
        ("mobile", &performance.mobile),
    ];
    for (label, metrics) in strategies {
        if let Some(score) = metrics.as_ref().and_then(|m| m.performance_score) {
            let _ = writeln!(out, "- PageSpeed {} score: {:.0}", label, score);
        }
    }
    out.push('\n');

    out
}

fn weight_by_type(report: &PageReport) -> String {
    let mut out = String::from("Total weight by resource type:\n");
    for (category, bytes) in report.category_totals.non_zero() {
        let _ = writeln!(
            out,
            "- {}: {}KB ({}MB)",
            category.label(),
            format_number(bytes_to_kb(bytes)),
            format_number(bytes_to_mb(bytes)),
        );
    }
    out
}

fn resource_list(report: &PageReport, rendering: Rendering) -> String {
    let mut out = String::from("\nResources sorted by weight (heaviest first):\n");
    out.push_str(SHORT_RULE);
    out.push('\n');

    for (i, resource) in report.resources.iter().enumerate() {
        let kb = format_number(bytes_to_kb(resource.bytes()));
        let mb = format_number(bytes_to_mb(resource.bytes()));

        let _ = match rendering {
            Rendering::Plain => writeln!(out, "{} - {}KB ({} MB)", resource.url, kb, mb),
            Rendering::Html => writeln!(
                out,
                "<a href='{}' class='underline'>R{} - {} - {}KB ({} MB)</a>",
                escape_html(&resource.url),
                i,
                escape_html(&extension(&resource.url)),
                kb,
                mb,
            ),
        };
    }

    out
}

fn grade_class(grade: Grade) -> &'static str {
    match grade {
        Grade::A | Grade::B => "text-green-400",
        Grade::C | Grade::D => "text-orange-400",
        _ => "text-red-400",
    }
}

// Extension of the last path segment, "" if none
fn extension(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| ext.to_string())
        .unwrap_or_default()
}

/// Formats with two decimals and a `,` thousands separator: 1234.5 -> "1,234.50"
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Escapes text for use inside HTML content or a quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
