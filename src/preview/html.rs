// src/preview/html.rs
//! Live preview page

use anyhow::Result;
use std::collections::HashMap;
use std::fmt::Write;

use super::{
    PhotoSlot, PreviewLayout, SectionBody, Slot, MIN_HEIGHT_PX, REFERENCE_WIDTH_PX,
};
use crate::core::template_engine::{TemplateEngine, TemplateKind};
use crate::utils::escape_html;

/// Render the layout as a standalone HTML document
pub fn render_page(layout: &PreviewLayout) -> Result<String> {
    let style = &layout.style;
    let background = match style.background_end {
        Some(end) => format!("linear-gradient(to right, {}, {})", style.background, end),
        None => style.background.to_string(),
    };

    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("page_title", escape_html(&layout.full_name.text));
    vars.insert("width", REFERENCE_WIDTH_PX.to_string());
    vars.insert("min_height", MIN_HEIGHT_PX.to_string());
    vars.insert("background", background);
    vars.insert("text", style.text.to_string());
    vars.insert("accent", style.accent.to_string());
    vars.insert("rule", style.rule.to_string());
    vars.insert("theme", layout.theme.as_str().to_string());
    vars.insert("body", render_body(layout));

    TemplateEngine::render(TemplateKind::HtmlPage, &vars)
}

fn render_body(layout: &PreviewLayout) -> String {
    let mut out = String::new();

    out.push_str("<header>\n<div class=\"photo\">");
    match &layout.photo {
        PhotoSlot::Image(photo) => {
            let _ = write!(
                out,
                "<img src=\"{}\" alt=\"Profile photo\">",
                escape_html(photo.data_uri())
            );
        }
        PhotoSlot::Placeholder(text) => {
            let _ = write!(out, "<div class=\"empty\">{}</div>", escape_html(text));
        }
    }
    out.push_str("</div>\n<div>");
    let _ = write!(out, "<h1>{}</h1>", slot(&layout.full_name));
    let _ = write!(out, "<h2>{}</h2>", slot(&layout.title));
    out.push_str("</div>\n</header>\n<main>\n<div class=\"primary\">\n");

    section(&mut out, "Professional Summary", |out| {
        let _ = write!(out, "<p class=\"details\">{}</p>", slot(&layout.summary));
    });

    section(&mut out, "Experience", |out| match &layout.experiences {
        SectionBody::Items(items) => {
            for exp in items {
                let _ = write!(
                    out,
                    "<div class=\"entry\"><h4>{}</h4><p class=\"meta\">{} | {}</p><p class=\"details\">{}</p></div>",
                    slot(&exp.role),
                    slot(&exp.company),
                    slot(&exp.duration),
                    slot(&exp.details)
                );
            }
        }
        SectionBody::Empty(text) => empty(out, text),
    });

    section(&mut out, "Projects", |out| match &layout.projects {
        SectionBody::Items(items) => {
            for proj in items {
                let _ = write!(out, "<div class=\"entry\"><h4>{}</h4>", slot(&proj.title));
                if let Some(link) = &proj.link {
                    let link = escape_html(link);
                    let _ = write!(
                        out,
                        "<a class=\"link\" href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                        link, link
                    );
                }
                let _ = write!(out, "<p class=\"details\">{}</p></div>", slot(&proj.details));
            }
        }
        SectionBody::Empty(text) => empty(out, text),
    });

    out.push_str("</div>\n<aside>\n");

    if !layout.contact.is_empty() {
        section(&mut out, "Contact", |out| {
            for item in &layout.contact {
                let _ = write!(
                    out,
                    "<div class=\"contact\"><span class=\"label\">{}</span><span>{}</span></div>",
                    item.kind.label(),
                    escape_html(&item.text)
                );
            }
        });
    }

    section(&mut out, "Education", |out| match &layout.education {
        SectionBody::Items(items) => {
            for edu in items {
                let _ = write!(
                    out,
                    "<div class=\"entry\"><h4>{}</h4><p class=\"meta\">{}</p><p class=\"meta\">{}</p></div>",
                    slot(&edu.degree),
                    slot(&edu.institute),
                    slot(&edu.year)
                );
            }
        }
        SectionBody::Empty(text) => empty(out, text),
    });

    section(&mut out, "Skills", |out| tags(out, &layout.skills));
    section(&mut out, "Languages", |out| tags(out, &layout.languages));

    section(&mut out, "Certifications", |out| match &layout.certifications {
        SectionBody::Items(items) => {
            for cert in items {
                let _ = write!(
                    out,
                    "<div class=\"entry\"><h4>{}</h4><p class=\"meta\">{}",
                    slot(&cert.name),
                    slot(&cert.issuer)
                );
                if let Some(year) = &cert.year {
                    let _ = write!(out, " ({})", escape_html(year));
                }
                out.push_str("</p></div>");
            }
        }
        SectionBody::Empty(text) => empty(out, text),
    });

    if let Some(hobbies) = &layout.hobbies {
        section(&mut out, "Hobbies", |out| {
            let _ = write!(out, "<p class=\"details\">{}</p>", escape_html(hobbies));
        });
    }

    out.push_str("</aside>\n</main>");
    out
}

fn section(out: &mut String, title: &str, body: impl FnOnce(&mut String)) {
    let _ = write!(out, "<section><h3>{}</h3>", title);
    body(out);
    out.push_str("</section>\n");
}

fn slot(slot: &Slot) -> String {
    if slot.placeholder {
        format!("<span class=\"placeholder\">{}</span>", escape_html(&slot.text))
    } else {
        escape_html(&slot.text)
    }
}

fn empty(out: &mut String, text: &str) {
    let _ = write!(out, "<p class=\"muted\">{}</p>", escape_html(text));
}

fn tags(out: &mut String, body: &SectionBody<String>) {
    match body {
        SectionBody::Items(items) => {
            out.push_str("<div class=\"tags\">");
            for item in items {
                let _ = write!(out, "<span class=\"tag\">{}</span>", escape_html(item));
            }
            out.push_str("</div>");
        }
        SectionBody::Empty(text) => empty(out, text),
    }
}
