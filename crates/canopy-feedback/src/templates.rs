// crates/canopy-feedback/src/templates.rs
//
// Initial profile templates keyed by content-sensitivity category.
//
//   general      open engagement, formal mechanisms held back
//   educational  structured feedback and peer review, no bare reactions
//   sensitive    graduated feedback only
//   governance   deliberative mechanisms, no reactions
//   personal     reactions and endorsements, no formal challenge

use std::collections::{BTreeMap, BTreeSet};

use canopy_core::{FeedbackMechanism, ProfileTemplate, ProfileTemplateCatalog, SensitivityCategory};

/// The built-in template for every category.
pub fn default_templates() -> Vec<ProfileTemplate> {
    use FeedbackMechanism::*;

    let template = |category: SensitivityCategory,
                    permitted: &[FeedbackMechanism],
                    prohibited: &[FeedbackMechanism],
                    rationale: &str| ProfileTemplate {
        id: format!("template:{}", category),
        category,
        permitted: permitted.iter().copied().collect(),
        prohibited: prohibited.iter().copied().collect(),
        rationale: rationale.to_string(),
    };

    vec![
        template(
            SensitivityCategory::General,
            &[ViewOnly, EmotionalReaction, Endorsement, GraduatedFeedback, Discussion, Annotation],
            &[],
            "Everyday content; open engagement with formal mechanisms unlocked by attestation",
        ),
        template(
            SensitivityCategory::Educational,
            &[ViewOnly, Endorsement, GraduatedFeedback, Discussion, Annotation, PeerReview],
            &[EmotionalReaction],
            "Learning material; feedback should be specific enough to improve it",
        ),
        template(
            SensitivityCategory::Sensitive,
            &[ViewOnly, GraduatedFeedback],
            &[EmotionalReaction, Endorsement, ProposalVote],
            "Sensitive material; only considered, graduated responses",
        ),
        template(
            SensitivityCategory::Governance,
            &[ViewOnly, Discussion, ProposalVote, FormalChallenge],
            &[EmotionalReaction],
            "Governance material; deliberation and formal process",
        ),
        template(
            SensitivityCategory::Personal,
            &[ViewOnly, EmotionalReaction, Endorsement],
            &[FormalChallenge, PeerReview, ProposalVote],
            "Personal expression; support without adjudication",
        ),
    ]
}

/// Template catalog holding one template per category.
#[derive(Debug, Clone)]
pub struct DefaultTemplateCatalog {
    templates: BTreeMap<SensitivityCategory, ProfileTemplate>,
}

impl DefaultTemplateCatalog {
    pub fn new() -> Self {
        Self {
            templates: default_templates().into_iter().map(|t| (t.category, t)).collect(),
        }
    }

    /// Replace the template for its category.
    pub fn with_template(mut self, template: ProfileTemplate) -> Self {
        self.templates.insert(template.category, template);
        self
    }

    pub fn categories(&self) -> BTreeSet<SensitivityCategory> {
        self.templates.keys().copied().collect()
    }
}

impl Default for DefaultTemplateCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileTemplateCatalog for DefaultTemplateCatalog {
    fn template_for(&self, category: SensitivityCategory) -> Option<ProfileTemplate> {
        self.templates.get(&category).cloned()
    }
}
