//! Frame generators for the text animations

const PENDULUM_FRAMES: [&str; 4] = [
    "╔════╤╤╤╤════╗\n\
     ║    │││ \\   ║\n\
     ║    │││  O  ║\n\
     ║    OOO     ║",
    "╔════╤╤╤╤════╗\n\
     ║    ││││    ║\n\
     ║    ││││    ║\n\
     ║    OOOO    ║",
    "╔════╤╤╤╤════╗\n\
     ║   / │││    ║\n\
     ║  O  │││    ║\n\
     ║     OOO    ║",
    "╔════╤╤╤╤════╗\n\
     ║    ││││    ║\n\
     ║    ││││    ║\n\
     ║    OOOO    ║",
];

const SHARK_PREFIX: &str = "🦈 ";

/// A finite, deterministic sequence of text frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    /// Newton's cradle swinging through a fixed four-pose cycle
    Pendulum { frames: usize },
    /// A fin crossing a track of `length` cells in `turns` passes, each pass
    /// reversing direction, so two turns make one round trip
    Shark { length: usize, turns: usize },
}

impl Animation {
    pub fn name(&self) -> &'static str {
        match self {
            Animation::Pendulum { .. } => "pendulum",
            Animation::Shark { .. } => "shark",
        }
    }

    pub fn frame_count(&self) -> usize {
        match *self {
            Animation::Pendulum { frames } => frames,
            Animation::Shark { length, turns } => 2 + turns * length.saturating_sub(2),
        }
    }

    /// Frame at `step`, or `None` past the end
    pub fn frame(&self, step: usize) -> Option<String> {
        if step >= self.frame_count() {
            return None;
        }
        let frame = match *self {
            Animation::Pendulum { .. } => format!("```\n{}\n```", pendulum_frame(step)),
            Animation::Shark { length, .. } => {
                let span = length.saturating_sub(2);
                if step == 0 {
                    shark_frame(Some(0), length, false)
                } else if step == self.frame_count() - 1 {
                    shark_frame(None, length, false)
                } else {
                    let turn = (step - 1) / span;
                    let offset = (step - 1) % span + 1;
                    let right = turn % 2 == 0;
                    let pos = if right { offset } else { length - offset };
                    shark_frame(Some(pos), length, right)
                }
            }
        };
        Some(frame)
    }

    pub fn frames(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.frame_count()).filter_map(move |step| self.frame(step))
    }
}

pub fn pendulum_frame(step: usize) -> &'static str {
    PENDULUM_FRAMES[step % PENDULUM_FRAMES.len()]
}

/// Draw the track with the fin tip at `pos`; `None` draws an empty track.
///
/// Swimming right the fin reads `|\`, swimming left `/|`.
pub fn shark_frame(pos: Option<usize>, length: usize, right: bool) -> String {
    let mut track = String::with_capacity(length);
    for i in 0..length {
        let glyph = match pos {
            Some(p) if p == i => {
                if right {
                    '\\'
                } else {
                    '|'
                }
            }
            Some(p) if p == i + 1 => {
                if right {
                    '|'
                } else {
                    '/'
                }
            }
            _ => '_',
        };
        track.push(glyph);
    }
    format!("{}`{}`", SHARK_PREFIX, track)
}
