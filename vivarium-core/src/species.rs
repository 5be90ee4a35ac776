use std::convert::TryFrom;
use std::fmt;

/// What a body is, which decides every interaction rule it takes part in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Species {
    Food,
    Prey,
    Predator,
    /// Rendered but never advanced and ignored by every interaction.
    Inert,
}

impl Species {
    /// Integer classifier: 0 food, 1 prey, 2 predator, negative inert.
    pub fn tag(self) -> i32 {
        match self {
            Species::Food => 0,
            Species::Prey => 1,
            Species::Predator => 2,
            Species::Inert => -1,
        }
    }

    // Bodies with a non-negative tag belong to the resettable creature subset.
    pub fn is_tracked(self) -> bool {
        self.tag() >= 0
    }

    pub fn is_creature(self) -> bool {
        matches!(self, Species::Prey | Species::Predator)
    }
}

impl TryFrom<i32> for Species {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Species::Food),
            1 => Ok(Species::Prey),
            2 => Ok(Species::Predator),
            t if t < 0 => Ok(Species::Inert),
            t => Err(t),
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Species::Food => "food",
            Species::Prey => "prey",
            Species::Predator => "predator",
            Species::Inert => "inert",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_tags_are_inert() {
        assert_eq!(Species::try_from(-7), Ok(Species::Inert));
        assert_eq!(Species::try_from(3), Err(3));
    }

    #[test]
    fn only_inert_is_untracked() {
        assert!(Species::Food.is_tracked());
        assert!(Species::Predator.is_tracked());
        assert!(!Species::Inert.is_tracked());
        assert!(!Species::Food.is_creature());
    }
}
