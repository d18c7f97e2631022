//! First-run carousel shown once per user.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub title: &'static str,
    pub body: &'static str,
}

pub const SLIDES: [Slide; 3] = [
    Slide {
        title: "Spoon theory",
        body: "Every day you have a limited stock of energy: your spoons. Each action costs one or more. When the stock is empty, the risk of a crisis goes up.",
    },
    Slide {
        title: "Listen to your gauges",
        body: "Note your sensory, social and emotional levels regularly. Over time they show the early signs of a drop.",
    },
    Slide {
        title: "SOS mode",
        body: "During a shutdown (going mute, overload), turn on SOS mode. It shows a clear message to the people around you so you don't have to speak.",
    },
];

/// Outcome of pressing "next" on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Finished,
}

pub fn slide(step: usize) -> Option<&'static Slide> {
    SLIDES.get(step)
}

pub fn advance(step: usize) -> Advance {
    if step + 1 < SLIDES.len() {
        Advance::Next(step + 1)
    } else {
        Advance::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walks_three_slides_then_finishes() {
        assert_eq!(advance(0), Advance::Next(1));
        assert_eq!(advance(1), Advance::Next(2));
        assert_eq!(advance(2), Advance::Finished);
        assert_eq!(slide(2).map(|s| s.title), Some("SOS mode"));
        assert!(slide(3).is_none());
    }
}
