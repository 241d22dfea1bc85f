//! SACD positions are stored on disc as "minute:second:frame" time
//! codes, where one frame is 1/75th of a second of audio.
//!
//! Unlike the time codes of a regular audio CD the three components are
//! plain binary, not BCD.

use std::{cmp, fmt};

/// SACD "minute:second:frame" time code
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct FrameTime {
    minutes: u8,
    seconds: u8,
    frames: u8,
}

impl FrameTime {
    /// Create a 00:00:00 time code
    pub fn zero() -> FrameTime {
        FrameTime {
            minutes: 0,
            seconds: 0,
            frames: 0,
        }
    }

    /// Build a time code from its three components. Returns `None` if
    /// `seconds` is greater than 59 or `frames` is greater than 74.
    pub fn new(minutes: u8, seconds: u8, frames: u8) -> Option<FrameTime> {
        // There are only 75 frames per second and obviously 60 seconds
        // per minute
        if seconds < 60 && frames < 75 {
            Some(FrameTime {
                minutes,
                seconds,
                frames,
            })
        } else {
            None
        }
    }

    /// Return the minutes component
    pub fn minutes(self) -> u8 {
        self.minutes
    }

    /// Return the seconds component
    pub fn seconds(self) -> u8 {
        self.seconds
    }

    /// Return the frames component
    pub fn frames(self) -> u8 {
        self.frames
    }

    /// Convert the time code into an absolute frame number. Frame
    /// number 0 is time code 00:00:00.
    pub fn frame_number(self) -> u32 {
        let m = u32::from(self.minutes);
        let s = u32::from(self.seconds);
        let f = u32::from(self.frames);

        // 60 seconds in a minute, 75 frames in a second
        (60 * 75 * m) + (75 * s) + f
    }

    /// Build a time code from an absolute frame number. Returns `None`
    /// if the number of minutes doesn't fit in a byte.
    pub fn from_frame_number(fnum: u32) -> Option<FrameTime> {
        let m = fnum / (60 * 75);

        if m > 255 {
            return None;
        }

        let fnum = fnum % (60 * 75);

        let s = fnum / 75;
        let f = fnum % 75;

        FrameTime::new(m as u8, s as u8, f as u8)
    }
}

impl fmt::Display for FrameTime {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{:02}:{:02}:{:02}",
            self.minutes, self.seconds, self.frames
        )
    }
}

impl cmp::PartialOrd for FrameTime {
    fn partial_cmp(&self, other: &FrameTime) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl cmp::Ord for FrameTime {
    fn cmp(&self, other: &FrameTime) -> cmp::Ordering {
        self.frame_number().cmp(&other.frame_number())
    }
}
