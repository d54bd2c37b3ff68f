// src/editor.rs
//! Typed field updates for the CV form.
//!
//! Every change the form can make to a [`CvDocument`] is one [`Update`] value, so
//! the web layer, the CLI and the tests all go through the same `apply` path.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::{
    CertificationEntry, Contact, CvDocument, EducationEntry, ExperienceEntry, ProjectEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    FullName,
    Title,
    Summary,
    Hobbies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Email,
    Phone,
    Website,
    Linkedin,
}

/// List fields whose elements are sub-records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryList {
    Experiences,
    Education,
    Projects,
    Certifications,
}

/// List fields whose elements are plain strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagList {
    Skills,
    Languages,
}

impl TagList {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skills => "skills",
            Self::Languages => "languages",
        }
    }
}

impl FromStr for TagList {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skills" => Ok(Self::Skills),
            "languages" => Ok(Self::Languages),
            other => anyhow::bail!("Unknown tag list: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceField {
    Role,
    Company,
    Duration,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationField {
    Degree,
    Institute,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectField {
    Title,
    Link,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationField {
    Name,
    Issuer,
    Year,
}

/// A sub-field of one entry; the variant names the list it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryField {
    Experience(ExperienceField),
    Education(EducationField),
    Project(ProjectField),
    Certification(CertificationField),
}

impl EntryField {
    pub fn list(&self) -> EntryList {
        match self {
            Self::Experience(_) => EntryList::Experiences,
            Self::Education(_) => EntryList::Education,
            Self::Project(_) => EntryList::Projects,
            Self::Certification(_) => EntryList::Certifications,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Update {
    SetText {
        field: TextField,
        value: String,
    },
    SetContact {
        field: ContactField,
        value: String,
    },
    AddEntry {
        list: EntryList,
    },
    RemoveEntry {
        list: EntryList,
        index: usize,
    },
    SetEntryField {
        index: usize,
        field: EntryField,
        value: String,
    },
    AddTag {
        list: TagList,
        value: String,
    },
    RemoveTag {
        list: TagList,
        index: usize,
    },
}

impl CvDocument {
    /// Apply one form update. Returns `false` when the update was a no-op
    /// (out-of-range index, blank tag).
    pub fn apply(&mut self, update: Update) -> bool {
        match update {
            Update::SetText { field, value } => {
                *self.text_mut(field) = value;
                true
            }
            Update::SetContact { field, value } => {
                *contact_slot(&mut self.contact, field) = Some(value);
                true
            }
            Update::AddEntry { list } => {
                match list {
                    EntryList::Experiences => self.experiences.push(ExperienceEntry::default()),
                    EntryList::Education => self.education.push(EducationEntry::default()),
                    EntryList::Projects => self.projects.push(ProjectEntry::default()),
                    EntryList::Certifications => {
                        self.certifications.push(CertificationEntry::default())
                    }
                }
                true
            }
            Update::RemoveEntry { list, index } => match list {
                EntryList::Experiences => remove_at(&mut self.experiences, index),
                EntryList::Education => remove_at(&mut self.education, index),
                EntryList::Projects => remove_at(&mut self.projects, index),
                EntryList::Certifications => remove_at(&mut self.certifications, index),
            },
            Update::SetEntryField {
                index,
                field,
                value,
            } => match self.entry_slot(index, field) {
                Some(slot) => {
                    *slot = Some(value);
                    true
                }
                None => false,
            },
            Update::AddTag { list, value } => {
                let value = value.trim();
                if value.is_empty() {
                    return false;
                }
                self.tags_mut(list).push(value.to_string());
                true
            }
            Update::RemoveTag { list, index } => remove_at(self.tags_mut(list), index),
        }
    }

    pub fn tags(&self, list: TagList) -> &[String] {
        match list {
            TagList::Skills => &self.skills,
            TagList::Languages => &self.languages,
        }
    }

    fn tags_mut(&mut self, list: TagList) -> &mut Vec<String> {
        match list {
            TagList::Skills => &mut self.skills,
            TagList::Languages => &mut self.languages,
        }
    }

    fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::FullName => &mut self.full_name,
            TextField::Title => &mut self.title,
            TextField::Summary => &mut self.summary,
            TextField::Hobbies => &mut self.hobbies,
        }
    }

    fn entry_slot(&mut self, index: usize, field: EntryField) -> Option<&mut Option<String>> {
        let slot = match field {
            EntryField::Experience(f) => {
                let entry = self.experiences.get_mut(index)?;
                match f {
                    ExperienceField::Role => &mut entry.role,
                    ExperienceField::Company => &mut entry.company,
                    ExperienceField::Duration => &mut entry.duration,
                    ExperienceField::Details => &mut entry.details,
                }
            }
            EntryField::Education(f) => {
                let entry = self.education.get_mut(index)?;
                match f {
                    EducationField::Degree => &mut entry.degree,
                    EducationField::Institute => &mut entry.institute,
                    EducationField::Year => &mut entry.year,
                }
            }
            EntryField::Project(f) => {
                let entry = self.projects.get_mut(index)?;
                match f {
                    ProjectField::Title => &mut entry.title,
                    ProjectField::Link => &mut entry.link,
                    ProjectField::Details => &mut entry.details,
                }
            }
            EntryField::Certification(f) => {
                let entry = self.certifications.get_mut(index)?;
                match f {
                    CertificationField::Name => &mut entry.name,
                    CertificationField::Issuer => &mut entry.issuer,
                    CertificationField::Year => &mut entry.year,
                }
            }
        };
        Some(slot)
    }
}

fn contact_slot(contact: &mut Contact, field: ContactField) -> &mut Option<String> {
    match field {
        ContactField::Email => &mut contact.email,
        ContactField::Phone => &mut contact.phone,
        ContactField::Website => &mut contact.website,
        ContactField::Linkedin => &mut contact.linkedin,
    }
}

fn remove_at<T>(items: &mut Vec<T>, index: usize) -> bool {
    if index < items.len() {
        items.remove(index);
        true
    } else {
        false
    }
}

// ===== Tag input box =====

/// Keys the tag box reacts to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Key {
    Enter,
    Other,
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Enter" => Self::Enter,
            _ => Self::Other,
        }
    }
}

/// Text buffer behind the skill/language input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagInput {
    buffer: String,
}

impl TagInput {
    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.buffer = value.into();
    }

    /// Turn the buffer into an `AddTag` update. Blank input is left untouched
    /// and yields nothing; a successful submit clears the buffer.
    pub fn submit(&mut self, list: TagList) -> Option<Update> {
        let value = self.buffer.trim();
        if value.is_empty() {
            return None;
        }
        let update = Update::AddTag {
            list,
            value: value.to_string(),
        };
        self.buffer.clear();
        Some(update)
    }

    pub fn key(&mut self, list: TagList, key: &Key) -> Option<Update> {
        match key {
            Key::Enter => self.submit(list),
            Key::Other => None,
        }
    }
}
