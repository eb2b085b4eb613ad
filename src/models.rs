use std::fmt;

use serde::{Deserialize, Serialize};

/// Disease classes in the order the model emits its scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiseaseClass {
    EarlyBlight,
    LateBlight,
    Healthy,
}

impl DiseaseClass {
    pub const ALL: [DiseaseClass; 3] = [
        DiseaseClass::EarlyBlight,
        DiseaseClass::LateBlight,
        DiseaseClass::Healthy,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            DiseaseClass::EarlyBlight => "Early Blight",
            DiseaseClass::LateBlight => "Late Blight",
            DiseaseClass::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for DiseaseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResponse {
    pub disease: String,
    pub confidence: f32,
}

/// One entry of the mock prediction list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DiseaseReport {
    pub name: String,
    /// Percentage, as rendered by the web frontend.
    pub confidence: f32,
    pub severity: Severity,
    pub description: String,
    pub treatment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub mode: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub message: String,
    pub version: String,
    pub mode: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Fixed response of the mock variant, highest confidence first.
pub fn mock_reports() -> Vec<DiseaseReport> {
    vec![
        DiseaseReport {
            name: DiseaseClass::LateBlight.label().to_string(),
            confidence: 87.0,
            severity: Severity::High,
            description: "Late blight is caused by the fungus-like organism Phytophthora infestans. \
                It appears as dark, water-soaked lesions on leaves that can quickly spread and \
                destroy the entire plant."
                .to_string(),
            treatment: "Apply fungicide immediately, improve air circulation, and remove infected \
                plant material. Consider copper-based treatments for organic management."
                .to_string(),
        },
        DiseaseReport {
            name: DiseaseClass::EarlyBlight.label().to_string(),
            confidence: 23.0,
            severity: Severity::Medium,
            description: "Early blight is caused by Alternaria solani and creates dark spots with \
                concentric rings on older leaves."
                .to_string(),
            treatment: "Use preventive fungicide sprays and ensure proper plant spacing for air \
                circulation."
                .to_string(),
        },
        DiseaseReport {
            name: DiseaseClass::Healthy.label().to_string(),
            confidence: 12.0,
            severity: Severity::Low,
            description: "The leaf appears to be healthy with no visible signs of disease."
                .to_string(),
            treatment: "Continue current care practices and monitor regularly for any changes."
                .to_string(),
        },
    ]
}
