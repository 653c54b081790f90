//! Metadata documents describing which course concepts a content file teaches.

use serde::{Deserialize, Serialize};

use crate::domain::MerrillQuadrant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataAttribute {
    Auditory,
    Visual,
    Video,
    Animation,
    Photograph,
    Diagram,
    Text,
    Interactive,
    LowDifficulty,
    MediumDifficulty,
    HighDifficulty,
    Realistic,
    Simulated,
}

impl MetadataAttribute {
    pub const ALL: [MetadataAttribute; 13] = [
        Self::Auditory,
        Self::Visual,
        Self::Video,
        Self::Animation,
        Self::Photograph,
        Self::Diagram,
        Self::Text,
        Self::Interactive,
        Self::LowDifficulty,
        Self::MediumDifficulty,
        Self::HighDifficulty,
        Self::Realistic,
        Self::Simulated,
    ];

    /// Offered when tagging Rule/Example content.
    pub fn is_content_attribute(self) -> bool {
        !matches!(self, Self::Realistic | Self::Simulated)
    }

    /// Offered when tagging a practice application.
    pub fn is_practice_attribute(self) -> bool {
        matches!(
            self,
            Self::LowDifficulty
                | Self::MediumDifficulty
                | Self::HighDifficulty
                | Self::Realistic
                | Self::Simulated
        )
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Auditory => "Auditory",
            Self::Visual => "Visual",
            Self::Video => "Video",
            Self::Animation => "Animation",
            Self::Photograph => "Photograph",
            Self::Diagram => "Diagram",
            Self::Text => "Text",
            Self::Interactive => "Interactive",
            Self::LowDifficulty => "Low Difficulty",
            Self::MediumDifficulty => "Medium Difficulty",
            Self::HighDifficulty => "High Difficulty",
            Self::Realistic => "Realistic",
            Self::Simulated => "Simulated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityType {
    Passive {
        #[serde(default)]
        attributes: Vec<MetadataAttribute>,
    },
    Active,
    Constructive,
    Interactive,
}

impl ActivityType {
    pub fn passive() -> Self {
        Self::Passive {
            attributes: Vec::new(),
        }
    }

    pub fn is_passive(&self) -> bool {
        matches!(self, Self::Passive { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConcept {
    pub name: String,
    pub activity_type: Option<ActivityType>,
}

impl MetadataConcept {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activity_type: None,
        }
    }

    pub fn passive_attributes(&self) -> Option<&[MetadataAttribute]> {
        match &self.activity_type {
            Some(ActivityType::Passive { attributes }) => Some(attributes.as_slice()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentAt {
    pub merrill_quadrant: Option<MerrillQuadrant>,
    #[serde(default)]
    pub remediation_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetadataContent {
    Simple(String),
    Url(String),
    LessonMaterial(String),
    TrainingApp(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub display_name: Option<String>,
    pub content: Option<MetadataContent>,
    #[serde(default)]
    pub present_at: PresentAt,
    #[serde(default)]
    pub concepts: Vec<MetadataConcept>,
}

impl Metadata {
    pub fn concept(&self, name: &str) -> Option<&MetadataConcept> {
        self.concepts.iter().find(|concept| concept.name == name)
    }

    pub fn concept_mut(&mut self, name: &str) -> Option<&mut MetadataConcept> {
        self.concepts.iter_mut().find(|concept| concept.name == name)
    }

    /// Phase the content lands in once its metadata file exists.
    pub fn target_phase(&self) -> Option<MerrillQuadrant> {
        match self.present_at.merrill_quadrant {
            Some(
                quadrant @ (MerrillQuadrant::Rule
                | MerrillQuadrant::Example
                | MerrillQuadrant::Practice),
            ) => Some(quadrant),
            Some(_) => None,
            None if self.present_at.remediation_only => Some(MerrillQuadrant::RemediationAfterRecall),
            None => None,
        }
    }
}

/// Server-side description of a metadata file found for a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataWrapper {
    pub metadata_file_path: String,
    pub display_name: String,
    pub content_file: Option<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub is_quadrant_resource: bool,
}
