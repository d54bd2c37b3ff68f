// src/core/template_engine.rs
//! Page shells for the preview serializers and `{{var}}` substitution

use anyhow::Result;
use std::collections::HashMap;

// ===== Built-in Templates =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    HtmlPage,
    TypstPage,
}

#[derive(Debug, Clone)]
pub struct TemplateInfo {
    pub id: &'static str,
    pub kind: TemplateKind,
    pub required: &'static [&'static str],
    source: &'static str,
}

const HTML_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{page_title}}</title>
<style>
  body { margin: 0; background: #f3f4f6; font-family: Inter, "Helvetica Neue", Arial, sans-serif; }
  .cv { box-sizing: border-box; width: {{width}}px; min-height: {{min_height}}px; margin: 24px auto; padding: 32px; font-size: 14px; background: {{background}}; color: {{text}}; }
  .cv header { display: flex; align-items: center; gap: 32px; margin-bottom: 32px; }
  .cv .photo { width: 128px; height: 128px; border-radius: 50%; overflow: hidden; flex-shrink: 0; border: 4px solid rgba(255,255,255,0.2); }
  .cv .photo img { width: 100%; height: 100%; object-fit: cover; }
  .cv .photo .empty { width: 100%; height: 100%; background: #d1d5db; color: #6b7280; display: flex; align-items: center; justify-content: center; }
  .cv h1 { font-size: 36px; margin: 0; }
  .cv h2 { font-size: 20px; font-weight: 500; margin: 4px 0 0; color: {{accent}}; }
  .cv main { display: grid; grid-template-columns: 2fr 1fr; gap: 32px; }
  .cv section { margin-bottom: 24px; }
  .cv h3 { font-size: 18px; margin: 0 0 12px; padding-bottom: 4px; border-bottom: 2px solid {{rule}}; }
  .cv h4 { margin: 0; font-size: 16px; }
  .cv .entry { margin-bottom: 16px; }
  .cv .meta { font-size: 12px; opacity: 0.7; margin: 2px 0 4px; }
  .cv .details { white-space: pre-wrap; opacity: 0.9; margin: 0; }
  .cv .link { font-size: 12px; color: {{accent}}; }
  .cv .muted { opacity: 0.5; }
  .cv .placeholder { opacity: 0.6; }
  .cv .tags { display: flex; flex-wrap: wrap; gap: 8px; }
  .cv .tag { font-size: 12px; padding: 4px 8px; border-radius: 6px; border: 1px solid rgba(255,255,255,0.2); background: rgba(255,255,255,0.1); }
  .cv .contact { display: flex; gap: 8px; margin-bottom: 8px; }
  .cv .contact .label { color: {{accent}}; min-width: 64px; }
</style>
</head>
<body>
<div class="cv theme-{{theme}}">
{{body}}
</div>
</body>
</html>
"#;

const TYPST_PAGE: &str = r#"#set page(width: {{width_pt}}pt, height: auto, margin: 0pt, fill: {{fill}})
#set text(size: 10.5pt, fill: rgb("{{text}}"), font: ("Inter", "Liberation Sans", "DejaVu Sans"))
#set par(leading: 0.55em)

#let faded(body) = text(fill: rgb("{{text}}").transparentize(35%), body)
#let section(title, body) = block(width: 100%, below: 18pt)[
  #block(width: 100%, stroke: (bottom: 1.5pt + rgb("{{rule}}")), inset: (bottom: 3pt), below: 9pt, text(size: 13.5pt, weight: "bold", title))
  #body
]

#grid(
  columns: (0pt, 1fr),
  box(height: {{min_height_pt}}pt),
  pad(24pt)[
{{body}}
  ],
)
"#;

const TEMPLATES: &[TemplateInfo] = &[
    TemplateInfo {
        id: "html-page",
        kind: TemplateKind::HtmlPage,
        required: &[
            "page_title",
            "width",
            "min_height",
            "background",
            "text",
            "accent",
            "rule",
            "theme",
            "body",
        ],
        source: HTML_PAGE,
    },
    TemplateInfo {
        id: "typst-page",
        kind: TemplateKind::TypstPage,
        required: &["width_pt", "min_height_pt", "fill", "text", "rule", "body"],
        source: TYPST_PAGE,
    },
];

// ===== Main Template Engine =====

pub struct TemplateEngine;

impl TemplateEngine {
    /// List available template ids
    pub fn list_templates() -> Vec<&'static str> {
        TEMPLATES.iter().map(|t| t.id).collect()
    }

    pub fn get_template(kind: TemplateKind) -> &'static TemplateInfo {
        TEMPLATES
            .iter()
            .find(|t| t.kind == kind)
            .unwrap_or(&TEMPLATES[0])
    }

    /// Substitute `{{var}}` and `${var}` placeholders
    pub fn process_variables(content: &str, variables: &HashMap<&str, String>) -> String {
        let mut result = content.to_string();
        for (key, value) in variables {
            let placeholder_mustache = format!("{{{{{}}}}}", key);
            let placeholder_shell = format!("${{{}}}", key);
            result = result.replace(&placeholder_mustache, value);
            result = result.replace(&placeholder_shell, value);
        }
        result
    }

    /// Render a built-in template, failing if a required variable is missing
    pub fn render(kind: TemplateKind, variables: &HashMap<&str, String>) -> Result<String> {
        let template = Self::get_template(kind);
        let missing: Vec<&str> = template
            .required
            .iter()
            .copied()
            .filter(|name| !variables.contains_key(name))
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "Template '{}' is missing variables: {:?}",
                template.id,
                missing
            );
        }

        // body goes last so user text is never scanned for placeholders
        let (body, rest): (Vec<_>, Vec<_>) = variables
            .iter()
            .partition(|(name, _)| **name == "body");
        let rest: HashMap<&str, String> = rest.into_iter().map(|(k, v)| (*k, v.clone())).collect();
        let mut output = Self::process_variables(template.source, &rest);
        if let Some((_, body)) = body.first() {
            output = output.replace("{{body}}", body);
        }
        Ok(output)
    }
}
