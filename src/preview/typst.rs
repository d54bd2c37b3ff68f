// src/preview/typst.rs
//! Typst source for the export rasterizer.
//!
//! The page is laid out at the reference width regardless of how the live
//! preview is being displayed, so every export has the same geometry. One CSS
//! pixel maps to 0.75pt; the page height grows with the content but never
//! drops below A4.

use anyhow::Result;
use std::collections::HashMap;
use std::fmt::Write;

use super::{
    PhotoSlot, PreviewLayout, SectionBody, Slot, ThemeStyle, MIN_HEIGHT_PX, PHOTO_PLACEHOLDER,
    REFERENCE_WIDTH_PX,
};
use crate::core::template_engine::{TemplateEngine, TemplateKind};
use crate::utils::typst_string;

pub const PT_PER_PX: f64 = 0.75;

/// Page width in points
pub fn page_width_pt() -> f64 {
    f64::from(REFERENCE_WIDTH_PX) * PT_PER_PX
}

/// Minimum page height in points
pub fn min_height_pt() -> f64 {
    f64::from(MIN_HEIGHT_PX) * PT_PER_PX
}

/// Render `main.typ` for the layout. `photo_file` is the photo's path relative
/// to the source file and must be set when the layout carries a photo.
pub fn render_source(layout: &PreviewLayout, photo_file: Option<&str>) -> Result<String> {
    let style = &layout.style;

    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("width_pt", page_width_pt().to_string());
    vars.insert("min_height_pt", min_height_pt().to_string());
    vars.insert("fill", page_fill(style));
    vars.insert("text", style.text.to_string());
    vars.insert("rule", style.rule.to_string());
    vars.insert("body", render_body(layout, photo_file));

    TemplateEngine::render(TemplateKind::TypstPage, &vars)
}

fn page_fill(style: &ThemeStyle) -> String {
    match style.background_end {
        Some(end) => format!(
            "gradient.linear(rgb(\"{}\"), rgb(\"{}\"))",
            style.background, end
        ),
        None => format!("rgb(\"{}\")", style.background),
    }
}

fn render_body(layout: &PreviewLayout, photo_file: Option<&str>) -> String {
    let accent = typst_string(layout.style.accent);
    let mut out = String::new();

    // header
    let _ = writeln!(
        out,
        "#grid(\n  columns: (96pt, 1fr),\n  column-gutter: 24pt,\n  align: horizon,\n  {},\n  stack(spacing: 6pt, text(size: 27pt, weight: \"bold\", {}), text(size: 15pt, fill: rgb({}), {})),\n)",
        photo(&layout.photo, photo_file),
        slot(&layout.full_name),
        accent,
        slot(&layout.title)
    );
    out.push_str("#v(24pt)\n#grid(\n  columns: (2fr, 1fr),\n  column-gutter: 24pt,\n  [\n");

    section(&mut out, "Professional Summary", &slot(&layout.summary));

    let experience = match &layout.experiences {
        SectionBody::Items(items) => items
            .iter()
            .map(|exp| {
                entry(&[
                    format!("text(size: 12pt, weight: \"bold\", {})", slot(&exp.role)),
                    format!(
                        "text(size: 9pt, [#{} | #{}])",
                        slot(&exp.company),
                        slot(&exp.duration)
                    ),
                    slot(&exp.details),
                ])
            })
            .collect::<Vec<_>>()
            .join(" #"),
        SectionBody::Empty(text) => empty(text),
    };
    section(&mut out, "Experience", &content(&experience));

    let projects = match &layout.projects {
        SectionBody::Items(items) => items
            .iter()
            .map(|proj| {
                let mut lines = vec![format!(
                    "text(size: 12pt, weight: \"bold\", {})",
                    slot(&proj.title)
                )];
                if let Some(url) = &proj.link {
                    let url = typst_string(url);
                    lines.push(format!(
                        "link({}, text(size: 9pt, fill: rgb({}), {}))",
                        url, accent, url
                    ));
                }
                lines.push(slot(&proj.details));
                entry(&lines)
            })
            .collect::<Vec<_>>()
            .join(" #"),
        SectionBody::Empty(text) => empty(text),
    };
    section(&mut out, "Projects", &content(&projects));

    out.push_str("  ],\n  [\n");

    if !layout.contact.is_empty() {
        let cells = layout
            .contact
            .iter()
            .map(|item| {
                format!(
                    "text(fill: rgb({}), {}), {}",
                    accent,
                    typst_string(item.kind.label()),
                    typst_string(&item.text)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        section(
            &mut out,
            "Contact",
            &format!(
                "grid(columns: (52pt, 1fr), row-gutter: 6pt, {})",
                cells
            ),
        );
    }

    let education = match &layout.education {
        SectionBody::Items(items) => items
            .iter()
            .map(|edu| {
                entry(&[
                    format!("text(weight: \"bold\", {})", slot(&edu.degree)),
                    format!("text(size: 9pt, {})", slot(&edu.institute)),
                    format!("text(size: 9pt, {})", slot(&edu.year)),
                ])
            })
            .collect::<Vec<_>>()
            .join(" #"),
        SectionBody::Empty(text) => empty(text),
    };
    section(&mut out, "Education", &content(&education));

    section(&mut out, "Skills", &tags(&layout.skills));
    section(&mut out, "Languages", &tags(&layout.languages));

    let certifications = match &layout.certifications {
        SectionBody::Items(items) => items
            .iter()
            .map(|cert| {
                let issuer = match &cert.year {
                    Some(year) => format!(
                        "text(size: 9pt, [#{} (#{})])",
                        slot(&cert.issuer),
                        typst_string(year)
                    ),
                    None => format!("text(size: 9pt, {})", slot(&cert.issuer)),
                };
                entry(&[
                    format!("text(weight: \"bold\", {})", slot(&cert.name)),
                    issuer,
                ])
            })
            .collect::<Vec<_>>()
            .join(" #"),
        SectionBody::Empty(text) => empty(text),
    };
    section(&mut out, "Certifications", &content(&certifications));

    if let Some(hobbies) = &layout.hobbies {
        section(&mut out, "Hobbies", &typst_string(hobbies));
    }

    out.push_str("  ],\n)");
    out
}

fn photo(photo: &PhotoSlot, photo_file: Option<&str>) -> String {
    match (photo, photo_file) {
        (PhotoSlot::Image(_), Some(file)) => format!(
            "box(width: 96pt, height: 96pt, radius: 48pt, clip: true, image({}, width: 96pt, height: 96pt, fit: \"cover\"))",
            typst_string(file)
        ),
        (PhotoSlot::Placeholder(text), _) => placeholder_photo(text),
        (PhotoSlot::Image(_), None) => placeholder_photo(PHOTO_PLACEHOLDER),
    }
}

fn placeholder_photo(text: &str) -> String {
    format!(
        "box(width: 96pt, height: 96pt, radius: 48pt, fill: rgb(\"#d1d5db\"), align(center + horizon, text(fill: rgb(\"#6b7280\"), {})))",
        typst_string(text)
    )
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "#section({}, {})", typst_string(title), body);
}

fn slot(slot: &Slot) -> String {
    if slot.placeholder {
        format!("faded({})", typst_string(&slot.text))
    } else {
        typst_string(&slot.text)
    }
}

fn entry(lines: &[String]) -> String {
    format!("block(below: 12pt, stack(spacing: 4pt, {}))", lines.join(", "))
}

fn content(code: &str) -> String {
    format!("[#{}]", code)
}

fn empty(text: &str) -> String {
    format!("faded({})", typst_string(text))
}

fn tags(body: &SectionBody<String>) -> String {
    match body {
        SectionBody::Items(items) => {
            let boxes = items
                .iter()
                .map(|tag| {
                    format!(
                        "#box(inset: (x: 6pt, y: 3pt), radius: 4pt, stroke: 0.5pt + rgb(\"#ffffff\").transparentize(80%), fill: rgb(\"#ffffff\").transparentize(90%), text(size: 9pt, {}))",
                        typst_string(tag)
                    )
                })
                .collect::<Vec<_>>()
                .join(" #h(2pt) ");
            format!("[{}]", boxes)
        }
        SectionBody::Empty(text) => empty(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::{NO_EXPERIENCE, SUMMARY_PLACEHOLDER};
    use crate::types::{CvDocument, ExperienceEntry, Photo, Theme};

    #[test]
    fn test_page_geometry() {
        let layout = PreviewLayout::build(&CvDocument::default(), None, Theme::Light);
        let source = render_source(&layout, None).unwrap();

        assert!(source.contains("#set page(width: 595.5pt, height: auto, margin: 0pt, fill: rgb(\"#ffffff\"))"));
        assert!(source.contains("box(height: 842.25pt)"));
        assert!(!source.contains("{{"));
    }

    #[test]
    fn test_multi_theme_uses_gradient() {
        let layout = PreviewLayout::build(&CvDocument::default(), None, Theme::Multi);
        let source = render_source(&layout, None).unwrap();
        assert!(source.contains("gradient.linear(rgb(\"#1f2937\"), rgb(\"#374151\"))"));
    }

    #[test]
    fn test_placeholders_are_faded_and_text_is_quoted() {
        let mut doc = CvDocument::default();
        doc.full_name = "Jane \"JQ\" #Public".to_string();
        doc.experiences.push(ExperienceEntry {
            role: Some("Lead".to_string()),
            ..Default::default()
        });

        let layout = PreviewLayout::build(&doc, None, Theme::Dark);
        let source = render_source(&layout, None).unwrap();

        assert!(source.contains(r#""Jane \"JQ\" #Public""#));
        assert!(source.contains(&format!("faded({})", typst_string(SUMMARY_PLACEHOLDER))));
        assert!(source.contains("#block(below: 12pt"));
        assert!(!source.contains(NO_EXPERIENCE));
    }

    #[test]
    fn test_photo_reference() {
        let photo = Photo::from_data_uri("data:image/png;base64,AAAA").unwrap();
        let layout = PreviewLayout::build(&CvDocument::default(), Some(&photo), Theme::Orange);

        let source = render_source(&layout, Some("photo.png")).unwrap();
        assert!(source.contains("image(\"photo.png\", width: 96pt, height: 96pt, fit: \"cover\")"));

        let without_file = render_source(&layout, None).unwrap();
        assert!(!without_file.contains("image("));
        assert!(without_file.contains("\"Photo\""));
    }
}
