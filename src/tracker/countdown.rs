use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Time to the next event of the selected pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Aos(Duration),
    Los(Duration),
    Past,
}

impl Countdown {
    pub fn at(aos: DateTime<Utc>, los: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < aos {
            Countdown::Aos(aos - now)
        } else if now < los {
            Countdown::Los(los - now)
        } else {
            Countdown::Past
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, left) = match self {
            Countdown::Aos(d) => ("AOS", d),
            Countdown::Los(d) => ("LOS", d),
            Countdown::Past => return write!(f, "Past Event"),
        };
        let secs = left.num_seconds().max(0);
        write!(
            f,
            "{} in {:02}:{:02}:{:02}",
            label,
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        )
    }
}
