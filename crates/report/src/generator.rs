// Rust guideline compliant 2026-10-15

//! Synthetic report traffic for demos and load tests.
//!
//! Drafts are scattered uniformly around a centre point and submitted through
//! a [`Reporter`], so they pass the same validation as real submissions. About
//! one draft in four carries a photo, uploaded through the `Storage` port
//! before the report is sent.

use std::cell::RefCell;
use std::time::Duration;

use domain::{Coordinates, Incident, IncidentDraft, Location, Producer, QueueError, Storage};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{ReportError, Reporter};

/// Description pool for generated drafts.
const DESCRIPTIONS: &[&str] = &[
    "Phone snatched at the bus stop",
    "Car window smashed overnight",
    "Group harassing passers-by",
    "Bike stolen from the rack",
    "Aggressive begging near the ATM",
    "Shoplifter chased out of the store",
    "Fight outside the chipper",
    "Drug dealing in the lane",
];

/// Configuration for a [`Generator`].
///
/// Construct via [`GeneratorConfig::builder`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Centre of the generated scatter.
    pub centre: Coordinates,
    /// Half-width of the scatter square, in degrees.
    pub spread: f64,
    /// Delay between successive submissions.
    pub interval: Duration,
    /// Optional upper bound on submissions. `None` means infinite.
    pub iterations: Option<u64>,
    /// Optional RNG seed for reproducible drafts.
    pub seed: Option<u64>,
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug)]
pub struct GeneratorConfigBuilder {
    centre: Coordinates,
    spread: f64,
    interval: Duration,
    iterations: Option<u64>,
    seed: Option<u64>,
}

impl GeneratorConfig {
    /// Create a builder centred on `centre`.
    ///
    /// Default values: `spread = 0.05`, `interval = 1 s`, `iterations = None`,
    /// `seed = None`.
    #[must_use]
    pub fn builder(centre: Coordinates) -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            centre,
            spread: 0.05,
            interval: Duration::from_secs(1),
            iterations: None,
            seed: None,
        }
    }
}

impl GeneratorConfigBuilder {
    #[must_use]
    pub fn spread(mut self, spread: f64) -> Self {
        self.spread = spread;
        self
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set a finite submission count.
    #[must_use]
    pub fn iterations(mut self, n: u64) -> Self {
        self.iterations = Some(n);
        self
    }

    /// Fix the RNG seed for deterministic output.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidConfig`] when the centre is off-planet or
    /// the spread is negative or not finite.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<GeneratorConfig, ReportError> {
        if !self.centre.is_on_earth() {
            return Err(ReportError::InvalidConfig { reason: "centre must be on earth".to_owned() });
        }
        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(ReportError::InvalidConfig {
                reason: "spread must be a finite value >= 0".to_owned(),
            });
        }
        Ok(GeneratorConfig {
            centre: self.centre,
            spread: self.spread,
            interval: self.interval,
            iterations: self.iterations,
            seed: self.seed,
        })
    }
}

/// Produces random incident drafts.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    /// Interior mutability required because all public methods take `&self`.
    rng: RefCell<StdRng>,
}

impl Generator {
    /// Seeds the RNG from `config.seed` if set, otherwise from the OS.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { config, rng: RefCell::new(rng) }
    }

    /// One random draft. Roughly one in ten happens on transportation
    /// without coordinates.
    #[must_use]
    pub fn generate(&self) -> IncidentDraft {
        let mut rng = self.rng.borrow_mut();
        let description = DESCRIPTIONS[rng.random_range(0..DESCRIPTIONS.len())].to_owned();

        if rng.random_ratio(1, 10) {
            return IncidentDraft {
                description,
                coordinates: None,
                location: Location::Transportation,
                image_id: None,
            };
        }

        let spread = self.config.spread;
        let centre = self.config.centre;
        let lat = (centre.lat + rng.random_range(-spread..=spread)).clamp(-90.0, 90.0);
        let lon = (centre.lon + rng.random_range(-spread..=spread)).clamp(-180.0, 180.0);
        IncidentDraft {
            description,
            coordinates: Some(Coordinates::new(lat, lon)),
            location: Location::FixedPlace,
            image_id: None,
        }
    }

    /// Fake JPEG bytes for roughly one draft in four.
    #[must_use]
    pub fn photo(&self) -> Option<Vec<u8>> {
        let mut rng = self.rng.borrow_mut();
        if !rng.random_ratio(1, 4) {
            return None;
        }
        let len = rng.random_range(64..=256);
        let mut body = vec![0xFF, 0xD8, 0xFF];
        body.extend((3..len).map(|_| rng.random::<u8>()));
        Some(body)
    }

    /// Submit generated drafts through `reporter` until stopped.
    ///
    /// Stops cleanly when `producer` signals [`QueueError::Closed`] or after
    /// `config.iterations` submissions.
    ///
    /// # Errors
    ///
    /// Returns any other [`ReportError`], including a failed photo upload.
    pub async fn run<P: Producer<Incident>, S: Storage>(
        &self,
        reporter: &Reporter,
        producer: &P,
        storage: &S,
    ) -> Result<(), ReportError> {
        let mut count = 0u64;
        loop {
            let mut draft = self.generate();
            if let Some(photo) = self.photo() {
                draft.image_id = Some(reporter.upload_image(storage, photo, "image/jpeg").await?);
            }
            match reporter.send_report(producer, draft).await {
                Ok(_) => {}
                Err(ReportError::Queue { source: QueueError::Closed }) => {
                    tracing::info!(count, "generator.run.stopped: queue closed");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }

            count += 1;
            if let Some(max) = self.config.iterations
                && count >= max
            {
                tracing::info!(count, "generator.run.stopped: iteration limit reached");
                return Ok(());
            }

            tokio::time::sleep(self.config.interval).await;
        }
    }
}
