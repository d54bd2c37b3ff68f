// src/preview/mod.rs
//! Pure CV preview layout.
//!
//! [`PreviewLayout::build`] resolves every empty field to its display placeholder
//! and picks the theme colours. The layout is then serialized by [`html`] for the
//! live page or by [`typst`] for rasterization; neither writes anything back into
//! the document.

pub mod html;
pub mod typst;

use serde::Serialize;

use crate::types::{CvDocument, Photo, Theme};

/// Designed page width in CSS pixels
pub const REFERENCE_WIDTH_PX: u32 = 794;
/// Minimum page height in CSS pixels (A4 at 96 dpi)
pub const MIN_HEIGHT_PX: u32 = 1123;

pub const PHOTO_PLACEHOLDER: &str = "Photo";
pub const NAME_PLACEHOLDER: &str = "Your Name";
pub const TITLE_PLACEHOLDER: &str = "Your Professional Title";
pub const SUMMARY_PLACEHOLDER: &str =
    "A brief summary about your professional background and career aspirations.";

pub const ROLE_PLACEHOLDER: &str = "Role";
pub const COMPANY_PLACEHOLDER: &str = "Company";
pub const DURATION_PLACEHOLDER: &str = "Duration";
pub const EXPERIENCE_DETAILS_PLACEHOLDER: &str = "Details about your role and achievements.";
pub const NO_EXPERIENCE: &str = "No experience added.";

pub const PROJECT_TITLE_PLACEHOLDER: &str = "Project Title";
pub const PROJECT_DETAILS_PLACEHOLDER: &str = "Project description.";
pub const NO_PROJECTS: &str = "No projects added.";

pub const DEGREE_PLACEHOLDER: &str = "Degree";
pub const INSTITUTE_PLACEHOLDER: &str = "Institute";
pub const YEAR_PLACEHOLDER: &str = "Year";
pub const NO_EDUCATION: &str = "No education added.";

pub const NO_SKILLS: &str = "No skills added.";
pub const NO_LANGUAGES: &str = "No languages added.";

pub const CERTIFICATION_PLACEHOLDER: &str = "Certification";
pub const ISSUER_PLACEHOLDER: &str = "Issuer";
pub const NO_CERTIFICATIONS: &str = "No certifications added.";

/// One rendered text slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub text: String,
    pub placeholder: bool,
}

impl Slot {
    fn resolve(value: Option<&str>, placeholder: &str) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(text) => Self {
                text: text.to_string(),
                placeholder: false,
            },
            None => Self {
                text: placeholder.to_string(),
                placeholder: true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PhotoSlot {
    Image(Photo),
    Placeholder(&'static str),
}

/// Either the entries of a section or the text shown when it has none
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SectionBody<T> {
    Items(Vec<T>),
    Empty(&'static str),
}

impl<T> SectionBody<T> {
    fn from_items(items: Vec<T>, empty: &'static str) -> Self {
        if items.is_empty() {
            Self::Empty(empty)
        } else {
            Self::Items(items)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperienceView {
    pub role: Slot,
    pub company: Slot,
    pub duration: Slot,
    pub details: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectView {
    pub title: Slot,
    pub link: Option<String>,
    pub details: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EducationView {
    pub degree: Slot,
    pub institute: Slot,
    pub year: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificationView {
    pub name: Slot,
    pub issuer: Slot,
    pub year: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Email,
    Phone,
    Website,
    Linkedin,
}

impl ContactKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Website => "Website",
            Self::Linkedin => "LinkedIn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactItem {
    pub kind: ContactKind,
    pub text: String,
}

/// Colours for one theme, as CSS hex strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeStyle {
    pub background: &'static str,
    /// Set for gradient themes; the gradient runs left to right
    pub background_end: Option<&'static str>,
    pub text: &'static str,
    pub rule: &'static str,
    pub accent: &'static str,
}

impl ThemeStyle {
    pub fn for_theme(theme: Theme) -> Self {
        const RULE: &str = "#818cf8";
        const ACCENT: &str = "#a5b4fc";

        match theme {
            Theme::Light => Self {
                background: "#ffffff",
                background_end: None,
                text: "#1f2937",
                rule: RULE,
                accent: ACCENT,
            },
            Theme::Dark => Self {
                background: "#1f2937",
                background_end: None,
                text: "#f3f4f6",
                rule: RULE,
                accent: ACCENT,
            },
            Theme::Orange => Self {
                background: "#fff7ed",
                background_end: None,
                text: "#7c2d12",
                rule: RULE,
                accent: ACCENT,
            },
            Theme::Multi => Self {
                background: "#1f2937",
                background_end: Some("#374151"),
                text: "#f3f4f6",
                rule: RULE,
                accent: ACCENT,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewLayout {
    pub theme: Theme,
    pub style: ThemeStyle,
    pub photo: PhotoSlot,
    pub full_name: Slot,
    pub title: Slot,
    pub summary: Slot,
    pub experiences: SectionBody<ExperienceView>,
    pub projects: SectionBody<ProjectView>,
    pub contact: Vec<ContactItem>,
    pub education: SectionBody<EducationView>,
    pub skills: SectionBody<String>,
    pub languages: SectionBody<String>,
    pub certifications: SectionBody<CertificationView>,
    pub hobbies: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

impl PreviewLayout {
    pub fn build(doc: &CvDocument, photo: Option<&Photo>, theme: Theme) -> Self {
        let photo = match photo {
            Some(photo) => PhotoSlot::Image(photo.clone()),
            None => PhotoSlot::Placeholder(PHOTO_PLACEHOLDER),
        };

        let experiences = doc
            .experiences
            .iter()
            .map(|exp| ExperienceView {
                role: Slot::resolve(exp.role.as_deref(), ROLE_PLACEHOLDER),
                company: Slot::resolve(exp.company.as_deref(), COMPANY_PLACEHOLDER),
                duration: Slot::resolve(exp.duration.as_deref(), DURATION_PLACEHOLDER),
                details: Slot::resolve(exp.details.as_deref(), EXPERIENCE_DETAILS_PLACEHOLDER),
            })
            .collect();

        let projects = doc
            .projects
            .iter()
            .map(|proj| ProjectView {
                title: Slot::resolve(proj.title.as_deref(), PROJECT_TITLE_PLACEHOLDER),
                link: non_empty(&proj.link),
                details: Slot::resolve(proj.details.as_deref(), PROJECT_DETAILS_PLACEHOLDER),
            })
            .collect();

        let contact = [
            (ContactKind::Email, &doc.contact.email),
            (ContactKind::Phone, &doc.contact.phone),
            (ContactKind::Website, &doc.contact.website),
            (ContactKind::Linkedin, &doc.contact.linkedin),
        ]
        .into_iter()
        .filter_map(|(kind, value)| non_empty(value).map(|text| ContactItem { kind, text }))
        .collect();

        let education = doc
            .education
            .iter()
            .map(|edu| EducationView {
                degree: Slot::resolve(edu.degree.as_deref(), DEGREE_PLACEHOLDER),
                institute: Slot::resolve(edu.institute.as_deref(), INSTITUTE_PLACEHOLDER),
                year: Slot::resolve(edu.year.as_deref(), YEAR_PLACEHOLDER),
            })
            .collect();

        let certifications = doc
            .certifications
            .iter()
            .map(|cert| CertificationView {
                name: Slot::resolve(cert.name.as_deref(), CERTIFICATION_PLACEHOLDER),
                issuer: Slot::resolve(cert.issuer.as_deref(), ISSUER_PLACEHOLDER),
                year: non_empty(&cert.year),
            })
            .collect();

        Self {
            theme,
            style: ThemeStyle::for_theme(theme),
            photo,
            full_name: Slot::resolve(Some(&doc.full_name), NAME_PLACEHOLDER),
            title: Slot::resolve(Some(&doc.title), TITLE_PLACEHOLDER),
            summary: Slot::resolve(Some(&doc.summary), SUMMARY_PLACEHOLDER),
            experiences: SectionBody::from_items(experiences, NO_EXPERIENCE),
            projects: SectionBody::from_items(projects, NO_PROJECTS),
            contact,
            education: SectionBody::from_items(education, NO_EDUCATION),
            skills: SectionBody::from_items(doc.skills.clone(), NO_SKILLS),
            languages: SectionBody::from_items(doc.languages.clone(), NO_LANGUAGES),
            certifications: SectionBody::from_items(certifications, NO_CERTIFICATIONS),
            hobbies: Some(doc.hobbies.clone()).filter(|h| !h.is_empty()),
        }
    }

    /// Every placeholder text currently on the page: header and entry slots in
    /// reading order, followed by the empty-section notices
    pub fn placeholders(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let mut empties: Vec<&str> = Vec::new();

        if let PhotoSlot::Placeholder(text) = &self.photo {
            out.push(*text);
        }
        push_slot(&mut out, &self.full_name);
        push_slot(&mut out, &self.title);
        push_slot(&mut out, &self.summary);

        match &self.experiences {
            SectionBody::Items(items) => {
                for e in items {
                    push_slot(&mut out, &e.role);
                    push_slot(&mut out, &e.company);
                    push_slot(&mut out, &e.duration);
                    push_slot(&mut out, &e.details);
                }
            }
            SectionBody::Empty(text) => empties.push(*text),
        }
        match &self.projects {
            SectionBody::Items(items) => {
                for p in items {
                    push_slot(&mut out, &p.title);
                    push_slot(&mut out, &p.details);
                }
            }
            SectionBody::Empty(text) => empties.push(*text),
        }
        match &self.education {
            SectionBody::Items(items) => {
                for e in items {
                    push_slot(&mut out, &e.degree);
                    push_slot(&mut out, &e.institute);
                    push_slot(&mut out, &e.year);
                }
            }
            SectionBody::Empty(text) => empties.push(*text),
        }
        if let SectionBody::Empty(text) = &self.skills {
            empties.push(*text);
        }
        if let SectionBody::Empty(text) = &self.languages {
            empties.push(*text);
        }
        match &self.certifications {
            SectionBody::Items(items) => {
                for c in items {
                    push_slot(&mut out, &c.name);
                    push_slot(&mut out, &c.issuer);
                }
            }
            SectionBody::Empty(text) => empties.push(*text),
        }

        out.extend(empties);
        out
    }
}

fn push_slot<'a>(out: &mut Vec<&'a str>, slot: &'a Slot) {
    if slot.placeholder {
        out.push(&slot.text);
    }
}
