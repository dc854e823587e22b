//! Per-month cache of isoline sets.
//!
//! One set per domain, built level by level. A set that was interrupted
//! keeps the levels it finished; the next request with the same settings
//! picks up where it stopped.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use clim_common::{ClimError, ClimResult, Domain, Month, ProgressSink, ProgressUpdate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contour::{generate_levels, IsoLine, SampledField};

/// Which thresholds to contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsoLineSettings {
    pub spacing: f64,
    pub min: f64,
    pub max: f64,
}

impl IsoLineSettings {
    pub fn new(spacing: f64, min: f64, max: f64) -> Self {
        Self { spacing, min, max }
    }

    /// Domain bounds with a spacing suited to the domain's units.
    pub fn for_domain(domain: Domain) -> Self {
        let spacing = match domain {
            Domain::Wind => 5.0,
            Domain::Current => 1.0,
            Domain::Pressure => 4.0,
            Domain::SeaTemperature => 2.0,
        };
        Self::new(spacing, domain.min_value(), domain.max_value())
    }

    pub fn validate(&self) -> ClimResult<()> {
        if !(self.spacing > 0.0) || !self.spacing.is_finite() {
            return Err(ClimError::Config(format!(
                "isoline spacing must be positive, got {}",
                self.spacing
            )));
        }
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ClimError::Config(format!(
                "isoline bounds {}..{} are invalid",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn levels(&self) -> Vec<f64> {
        generate_levels(self.min, self.max, self.spacing)
    }
}

#[derive(Debug)]
struct CachedSet {
    settings: IsoLineSettings,
    levels: Vec<f64>,
    lines: Vec<Arc<IsoLine>>,
}

impl CachedSet {
    fn is_complete(&self) -> bool {
        self.lines.len() == self.levels.len()
    }
}

/// Isoline sets for the active month.
#[derive(Debug, Default)]
pub struct IsoLineCache {
    month: Option<Month>,
    sets: HashMap<Domain, CachedSet>,
}

impl IsoLineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the isolines of `domain`, building any missing levels.
    ///
    /// `field` is only called when at least one level still has to be
    /// built. A month change drops every set; new settings for a domain
    /// drop that domain's set. When `progress` aborts, the levels built so
    /// far stay cached and [`ClimError::Aborted`] is returned.
    pub fn get_or_build<F>(
        &mut self,
        domain: Domain,
        month: Month,
        settings: &IsoLineSettings,
        field: F,
        progress: &mut dyn ProgressSink,
    ) -> ClimResult<Vec<Arc<IsoLine>>>
    where
        F: FnOnce() -> ClimResult<SampledField>,
    {
        settings.validate()?;

        if self.month != Some(month) {
            if !self.sets.is_empty() {
                debug!(month = month.index(), "Month changed, clearing isoline cache");
            }
            self.sets.clear();
            self.month = Some(month);
        }

        let set = self.sets.entry(domain).or_insert_with(|| CachedSet {
            settings: *settings,
            levels: settings.levels(),
            lines: Vec::new(),
        });
        if set.settings != *settings {
            debug!(domain = %domain, "Isoline settings changed, rebuilding");
            *set = CachedSet {
                settings: *settings,
                levels: settings.levels(),
                lines: Vec::new(),
            };
        }

        if set.is_complete() {
            return Ok(set.lines.clone());
        }

        let field = field()?;
        let total = set.levels.len();
        let resumed = set.lines.len();
        for step in resumed..total {
            let update = ProgressUpdate {
                step,
                total,
                message: "Building isolines",
            };
            if let ControlFlow::Break(()) = progress.update(update) {
                info!(domain = %domain, built = step, total, "Isoline build aborted");
                return Err(ClimError::Aborted);
            }
            set.lines.push(Arc::new(IsoLine::build(&field, set.levels[step])));
        }

        info!(
            domain = %domain,
            month = month.index(),
            levels = total,
            resumed,
            points = set.lines.iter().map(|l| l.point_count()).sum::<usize>(),
            "Built isolines"
        );
        Ok(set.lines.clone())
    }

    /// Levels already built for a domain.
    pub fn cached_levels(&self, domain: Domain) -> usize {
        self.sets.get(&domain).map(|s| s.lines.len()).unwrap_or(0)
    }

    pub fn is_complete(&self, domain: Domain) -> bool {
        self.sets.get(&domain).is_some_and(CachedSet::is_complete)
    }

    pub fn month(&self) -> Option<Month> {
        self.month
    }

    pub fn invalidate(&mut self, domain: Domain) {
        self.sets.remove(&domain);
    }

    pub fn clear(&mut self) {
        self.sets.clear();
        self.month = None;
    }
}
