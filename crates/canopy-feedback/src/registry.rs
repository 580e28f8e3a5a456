// crates/canopy-feedback/src/registry.rs
//
// Feedback profile lifecycle: instantiate from a template, resolve, and
// evolve through appended change entries.
//
// A profile's current `permitted_mechanisms` always equals the
// `new_mechanisms` of its last history entry. History is never rewritten.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use canopy_core::{
    min_friction, new_record_id, CanopyError, ChangeDirection, ChangeTrigger, Extensions,
    FeedbackMechanism, FeedbackProfile, KeyGuard, LockPolicy, ProfileChange,
    ProfileDetermination, ProfileStore, ProfileTemplateCatalog, SensitivityCategory,
};

/// Classify a change from `previous` to `next`.
///
/// A lower minimum friction tier opens easier engagement (upgrade); a higher
/// one narrows it (downgrade). At equal minimum friction, removing any
/// mechanism is a downgrade and a pure addition is an upgrade.
pub fn classify_change(
    previous: &BTreeSet<FeedbackMechanism>,
    next: &BTreeSet<FeedbackMechanism>,
) -> ChangeDirection {
    let before = min_friction(previous);
    let after = min_friction(next);
    if after < before {
        ChangeDirection::Upgrade
    } else if after > before {
        ChangeDirection::Downgrade
    } else if previous.difference(next).next().is_some() {
        ChangeDirection::Downgrade
    } else {
        ChangeDirection::Upgrade
    }
}

/// Profile resolver over a borrowed profile store and template catalog.
#[derive(Debug)]
pub struct FeedbackRegistry<'a, P: ProfileStore + ?Sized, C: ProfileTemplateCatalog + ?Sized> {
    profiles: &'a P,
    catalog: &'a C,
    policy: LockPolicy,
}

impl<'a, P: ProfileStore + ?Sized, C: ProfileTemplateCatalog + ?Sized> FeedbackRegistry<'a, P, C> {
    pub fn new(profiles: &'a P, catalog: &'a C) -> Self {
        Self::with_lock_policy(profiles, catalog, LockPolicy::Wait)
    }

    pub fn with_lock_policy(profiles: &'a P, catalog: &'a C, policy: LockPolicy) -> Self {
        Self {
            profiles,
            catalog,
            policy,
        }
    }

    fn lock(&self, content_id: &str) -> Result<KeyGuard<'a>, CanopyError> {
        self.profiles.writer_locks().acquire_with(content_id, self.policy)
    }

    /// Create the profile for new content from its category template.
    ///
    /// # Errors
    /// - `Validation` if the content id is empty or already has a profile.
    /// - `NotFound` if the catalog has no template for `category`.
    pub fn instantiate(
        &self,
        content_id: &str,
        category: SensitivityCategory,
        determined_by: &str,
        now: DateTime<Utc>,
    ) -> Result<FeedbackProfile, CanopyError> {
        if content_id.trim().is_empty() {
            return Err(CanopyError::Validation("Empty content id".into()));
        }
        let _guard = self.lock(content_id)?;
        if self.profiles.get(content_id)?.is_some() {
            return Err(CanopyError::Validation(format!(
                "Content {} already has a feedback profile",
                content_id
            )));
        }
        let template = self
            .catalog
            .template_for(category)
            .ok_or_else(|| CanopyError::NotFound(format!("Profile template for {}", category)))?;

        let profile = FeedbackProfile {
            id: new_record_id(),
            content_id: content_id.to_string(),
            permitted_mechanisms: template.permitted.clone(),
            prohibited_mechanisms: template.prohibited.clone(),
            determination: Some(ProfileDetermination {
                category,
                template_id: Some(template.id.clone()),
                determined_by: determined_by.to_string(),
                determined_at: now,
                rationale: Some(template.rationale.clone()),
            }),
            history: vec![ProfileChange {
                id: new_record_id(),
                changed_at: now,
                trigger: ChangeTrigger::Instantiated,
                direction: ChangeDirection::Initial,
                previous_mechanisms: BTreeSet::new(),
                new_mechanisms: template.permitted,
                reason: format!("Instantiated from {}", template.id),
            }],
            extensions: Extensions::new(),
        };
        self.profiles.put(profile.clone())?;

        tracing::info!(content_id, category = %category, template = %template.id, "Feedback profile instantiated");
        Ok(profile)
    }

    /// Current profile, or the strict view-only default when none exists.
    pub fn resolve(&self, content_id: &str) -> Result<FeedbackProfile, CanopyError> {
        match self.profiles.get(content_id)? {
            Some(profile) => Ok(profile),
            None => {
                tracing::debug!(content_id, "No feedback profile; using strict default");
                Ok(FeedbackProfile::strict_default(content_id))
            }
        }
    }

    /// Whether `mechanism` is currently permitted on the content.
    pub fn is_permitted(&self, content_id: &str, mechanism: FeedbackMechanism) -> Result<bool, CanopyError> {
        let profile = self.resolve(content_id)?;
        Ok(profile.permitted_mechanisms.contains(&mechanism)
            && !profile.prohibited_mechanisms.contains(&mechanism))
    }

    /// Replace the permitted set by appending a change entry.
    ///
    /// # Errors
    /// - `NotFound` if the content has no profile.
    /// - `Validation` for the `instantiated` trigger, an empty set, a set that
    ///   permits a prohibited mechanism, or a set equal to the current one.
    pub fn apply_change(
        &self,
        content_id: &str,
        trigger: ChangeTrigger,
        new_mechanisms: BTreeSet<FeedbackMechanism>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<ProfileChange, CanopyError> {
        if trigger == ChangeTrigger::Instantiated {
            return Err(CanopyError::Validation(
                "The instantiated trigger is reserved for profile creation".into(),
            ));
        }
        if new_mechanisms.is_empty() {
            return Err(CanopyError::Validation(
                "A profile must permit at least one mechanism".into(),
            ));
        }

        let _guard = self.lock(content_id)?;
        let mut profile = self
            .profiles
            .get(content_id)?
            .ok_or_else(|| CanopyError::NotFound(format!("Feedback profile for {}", content_id)))?;

        let conflicting: Vec<&str> = new_mechanisms
            .intersection(&profile.prohibited_mechanisms)
            .map(FeedbackMechanism::as_str)
            .collect();
        if !conflicting.is_empty() {
            tracing::warn!(content_id, ?conflicting, "Rejected profile change: prohibited mechanisms");
            return Err(CanopyError::Validation(format!(
                "Mechanisms prohibited on {}: {}",
                content_id,
                conflicting.join(", ")
            )));
        }
        if new_mechanisms == profile.permitted_mechanisms {
            return Err(CanopyError::Validation(format!(
                "Profile for {} already permits exactly these mechanisms",
                content_id
            )));
        }

        let direction = classify_change(&profile.permitted_mechanisms, &new_mechanisms);
        let change = ProfileChange {
            id: new_record_id(),
            changed_at: now,
            trigger,
            direction,
            previous_mechanisms: profile.permitted_mechanisms.clone(),
            new_mechanisms: new_mechanisms.clone(),
            reason: reason.to_string(),
        };
        profile.history.push(change.clone());
        profile.permitted_mechanisms = new_mechanisms;
        self.profiles.put(profile)?;

        tracing::info!(content_id, ?trigger, ?direction, "Feedback profile changed");
        Ok(change)
    }
}
