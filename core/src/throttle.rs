use log::debug;
use std::time::Duration;

/// Delay applied after each remote write and after each processed playlist,
/// to stay under the service's request-rate ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    Disabled,
    Fixed(Duration),
}

impl Throttle {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            Throttle::Disabled
        } else {
            Throttle::Fixed(Duration::from_millis(ms))
        }
    }

    pub fn delay(&self) -> Duration {
        match self {
            Throttle::Disabled => Duration::ZERO,
            Throttle::Fixed(d) => *d,
        }
    }

    pub async fn wait(&self) {
        if let Throttle::Fixed(d) = self {
            debug!("Throttling for {} ms", d.as_millis());
            tokio::time::sleep(*d).await;
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Throttle::Fixed(Self::DEFAULT_DELAY)
    }
}
