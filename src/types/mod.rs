pub mod cv_data;
pub mod response;

pub use cv_data::{
    CertificationEntry, Contact, CvDocument, EducationEntry, ExperienceEntry, Photo,
    ProjectEntry, Theme,
};
