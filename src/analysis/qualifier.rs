//! Qualifier and primary disambiguation.
//!
//! Precedence everywhere: an explicitly requested qualifier first, then a
//! primary marker, then the first candidate in discovery order.

use std::path::Path;

use super::model::{BeanDefinition, InjectionSite, ResolutionResult, ScanOutput};
use crate::types::Location;

/// Qualifiers bind only when both are absent or both are present and equal.
pub fn qualifier_matches(required: Option<&str>, candidate: Option<&str>) -> bool {
    required == candidate
}

/// Definitions of `produced_type` eligible for `required`, best first.
///
/// One entry means the choice is unambiguous. Several entries are equally
/// ranked and kept in scan order, so the first is the fallback.
pub fn select_definitions<'a>(
    beans: &'a [BeanDefinition],
    produced_type: &str,
    required: Option<&str>,
) -> Vec<&'a BeanDefinition> {
    let candidates: Vec<&BeanDefinition> = beans
        .iter()
        .filter(|bean| bean.produced_type == produced_type)
        .filter(|bean| qualifier_matches(required, bean.qualifier.as_deref()))
        .collect();

    if required.is_some() {
        return candidates;
    }

    let primaries: Vec<&BeanDefinition> = candidates
        .iter()
        .copied()
        .filter(|bean| bean.is_primary)
        .collect();
    if primaries.is_empty() {
        candidates
    } else {
        primaries
    }
}

/// Resolve an injection site against definitions found in `path`.
pub fn resolve_site(site: &InjectionSite, beans: &[BeanDefinition], path: &Path) -> ResolutionResult {
    let locations = select_definitions(beans, &site.consumed_type, site.qualifier.as_deref())
        .into_iter()
        .map(|bean| Location::new(path, bean.range))
        .collect();
    ResolutionResult::from_candidates(locations)
}

/// Two-way links between the definitions and sites of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeanLinks {
    /// `injections[i]` -> indices of the beans it may receive.
    pub injection_candidates: Vec<Vec<usize>>,
    /// `beans[i]` -> indices of the injections it may satisfy.
    pub bean_usages: Vec<Vec<usize>>,
}

impl BeanLinks {
    pub fn build(output: &ScanOutput) -> Self {
        let mut bean_usages = vec![Vec::new(); output.beans.len()];
        let injection_candidates = output
            .injections
            .iter()
            .enumerate()
            .map(|(site_idx, site)| {
                let selected =
                    select_definitions(&output.beans, &site.consumed_type, site.qualifier.as_deref());
                let indices: Vec<usize> = output
                    .beans
                    .iter()
                    .enumerate()
                    .filter(|(_, bean)| selected.iter().any(|s| std::ptr::eq(*s, *bean)))
                    .map(|(idx, _)| idx)
                    .collect();
                for &bean_idx in &indices {
                    bean_usages[bean_idx].push(site_idx);
                }
                indices
            })
            .collect();

        Self {
            injection_candidates,
            bean_usages,
        }
    }
}

/// Incremental picker used while walking candidates from external sources.
#[derive(Debug, Clone)]
pub struct CandidatePicker<T> {
    required: Option<String>,
    exact: Option<T>,
    primary: Option<T>,
    fallback: Option<T>,
}

/// What the picker did with an offered candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Carries the required qualifier; search can stop.
    Exact,
    /// Primary without a required qualifier; search can stop.
    Primary,
    /// Remembered as the first-seen fallback.
    Fallback,
    Ignored,
}

impl Offer {
    pub fn is_decisive(&self) -> bool {
        matches!(self, Offer::Exact | Offer::Primary)
    }
}

impl<T> CandidatePicker<T> {
    pub fn new(required: Option<&str>) -> Self {
        Self {
            required: required.map(str::to_string),
            exact: None,
            primary: None,
            fallback: None,
        }
    }

    pub fn required(&self) -> Option<&str> {
        self.required.as_deref()
    }

    /// Offer a candidate. `carries_required` says whether it shows the
    /// requested qualifier literal and is ignored when none was requested.
    pub fn offer(&mut self, candidate: T, carries_required: bool, is_primary: bool) -> Offer {
        if self.required.is_some() {
            if carries_required && self.exact.is_none() {
                self.exact = Some(candidate);
                return Offer::Exact;
            }
            return Offer::Ignored;
        }
        if is_primary && self.primary.is_none() {
            self.primary = Some(candidate);
            return Offer::Primary;
        }
        if self.fallback.is_none() {
            self.fallback = Some(candidate);
            return Offer::Fallback;
        }
        Offer::Ignored
    }

    pub fn has_exact(&self) -> bool {
        self.exact.is_some()
    }

    /// Exact or primary match found.
    pub fn is_decided(&self) -> bool {
        self.exact.is_some() || self.primary.is_some()
    }

    pub fn into_best(self) -> Option<T> {
        self.exact.or(self.primary).or(self.fallback)
    }
}
