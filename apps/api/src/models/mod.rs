pub mod language;
pub mod records;
pub mod resume;

pub use language::Language;
pub use resume::{
    DocumentMetadata, Education, EducationEntry, ExperienceEntry, LanguageEntry, MilitaryService,
    PersonalInfo, Proficiency, ResumeDocument, SkillEntry, SkillLevel, Skills, MAX_BULLET_CHARS,
};
