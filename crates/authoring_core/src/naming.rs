//! Names of the files generated when content is added to a course.

use chrono::NaiveDateTime;

pub const METADATA_FILE_EXTENSION: &str = ".metadata.xml";
pub const LESSON_MATERIAL_FILE_EXTENSION: &str = ".lessonMaterial.xml";
pub const TRAINING_APP_FILE_EXTENSION: &str = ".trainingapp.xml";
pub const DKF_FILE_EXTENSION: &str = ".dkf.xml";
pub const QUESTION_EXPORT_SUFFIX: &str = ".question.export";

const URL_NAME_MAX_LEN: usize = 30;
const URL_NAME_KEPT_LEN: usize = 29;
const FILE_NAME_FORBIDDEN: &[char] = &['/', '\\', '"', ':', '*', '<', '>', '|', '?', '='];

/// `ddMMyyhhmmss`, twelve-hour clock.
pub fn file_stamp(now: NaiveDateTime) -> String {
    now.format("%d%m%y%I%M%S").to_string()
}

/// Last path segment of a workspace path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Metadata file for an uploaded content file, keeping its extension so that
/// `deck.pps` and `deck.html` do not collide.
pub fn metadata_path_for_file(course_folder_path: &str, content_path: &str) -> String {
    format!(
        "{course_folder_path}/{}{METADATA_FILE_EXTENSION}",
        file_name(content_path)
    )
}

/// Web address reduced to something usable as a workspace file name.
pub fn escape_url(url: &str) -> String {
    let escaped: String = url.chars().filter(|c| !FILE_NAME_FORBIDDEN.contains(c)).collect();
    if escaped.chars().count() > URL_NAME_MAX_LEN {
        let kept: String = escaped.chars().take(URL_NAME_KEPT_LEN).collect();
        format!("{kept}...")
    } else {
        escaped
    }
}

pub fn metadata_path_for_url(course_folder_path: &str, url: &str, now: NaiveDateTime) -> String {
    format!(
        "{course_folder_path}/{}_{}{METADATA_FILE_EXTENSION}",
        escape_url(url),
        file_stamp(now)
    )
}

/// Content kinds the editor names itself when it writes the content file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedContent {
    LessonMaterial,
    QuestionExport,
    ConversationTree,
}

impl GeneratedContent {
    fn prefix(self) -> &'static str {
        match self {
            Self::LessonMaterial => "MediaContent",
            Self::QuestionExport => "QuestionContent",
            Self::ConversationTree => "ConversationTree",
        }
    }

    fn reference_suffix(self) -> Option<&'static str> {
        match self {
            Self::LessonMaterial => Some(LESSON_MATERIAL_FILE_EXTENSION),
            Self::QuestionExport => Some(QUESTION_EXPORT_SUFFIX),
            Self::ConversationTree => None,
        }
    }
}

/// Paths for one generated piece of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNames {
    /// Base name without folder, e.g. `MediaContent_180926031502`.
    pub content_name: String,
    /// Reference file name relative to the course folder, if one is written.
    pub reference_file_name: Option<String>,
    pub reference_path: Option<String>,
    pub metadata_path: String,
}

pub fn generated_names(
    course_folder_path: &str,
    kind: GeneratedContent,
    now: NaiveDateTime,
) -> GeneratedNames {
    let content_name = format!("{}_{}", kind.prefix(), file_stamp(now));
    let base = format!("{course_folder_path}/{content_name}");
    let reference_file_name = kind
        .reference_suffix()
        .map(|suffix| format!("{content_name}{suffix}"));
    GeneratedNames {
        reference_path: kind.reference_suffix().map(|suffix| format!("{base}{suffix}")),
        metadata_path: format!("{base}{METADATA_FILE_EXTENSION}"),
        reference_file_name,
        content_name,
    }
}

/// Training-app reference and metadata paths named after the linked DKF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingAppNames {
    pub base: String,
    pub reference_file_name: String,
    pub reference_path: String,
    pub metadata_path: String,
}

pub fn training_app_names(course_folder_path: &str, dkf_path: &str) -> TrainingAppNames {
    let name = file_name(dkf_path);
    let dkf_name = name.strip_suffix(DKF_FILE_EXTENSION).unwrap_or(name);
    let base = format!("{course_folder_path}/{dkf_name}");
    TrainingAppNames {
        reference_file_name: format!("{dkf_name}{TRAINING_APP_FILE_EXTENSION}"),
        reference_path: format!("{base}{TRAINING_APP_FILE_EXTENSION}"),
        metadata_path: format!("{base}{METADATA_FILE_EXTENSION}"),
        base,
    }
}
