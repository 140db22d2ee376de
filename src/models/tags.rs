//! Enumerated ABC tags and the catalog used to populate choice lists.
//!
//! Every tag serializes as its display label (e.g. `"Self-injurious behavior"`)
//! so stored JSON arrays stay readable and match what observers picked.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} tag '{value}'")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! tag_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownTag;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|tag| tag.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| UnknownTag {
                        kind: $kind,
                        value: value.to_string(),
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

tag_enum! {
    /// Context present before the incident (sleep, medication, transitions...).
    SettingEvent, "setting event" {
        LackOfSleep => "Lack of sleep",
        StressFatigue => "Stress/fatigue",
        MedicationChange => "Medication change",
        RecentBreak => "Recent break",
        PeerInteraction => "Peer interaction",
        AdultInteraction => "Adult interaction",
        EnvironmentalDisruption => "Environmental disruption",
    }
}

tag_enum! {
    /// Behaviors targeted by a student's intervention plan.
    TargetBehavior, "target behavior" {
        Elopement => "Elopement",
        Aggression => "Aggression",
        SelfInjurious => "Self-injurious behavior",
        Disruption => "Disruption",
        Noncompliance => "Defiance/noncompliance",
        Tantrum => "Tantrum/crying",
        Stereotypy => "Stereotypy/self-stimming behavior",
        VocalDisruption => "Vocal/verbal disruption including yelling",
        Other => "Other",
    }
}

tag_enum! {
    ReplacementBehavior, "replacement behavior" {
        UsedCopingStrategy => "Used coping strategy",
        VerbalizedNeed => "Verbalized need appropriately",
        UsedVisualSupports => "Used AAC/visual supports",
        FollowedDirections => "Followed directions",
        RequestedBreak => "Requested break appropriately",
        StayedInArea => "Stayed in designated area",
        CompletedTasks => "Completed work area tasks",
        WalkedAway => "Walked away from conflict",
    }
}

tag_enum! {
    /// Staff responses delivered after the behavior.
    Consequence, "consequence" {
        DemandModification => "Task / Demand Modification",
        Redirection => "Redirection/prompting",
        BreaksOrMovement => "Breaks or Movement",
        VerbalDeescalation => "Verbal de-escalation",
        PreferredItems => "Access to Preferred Items",
        PreferredPerson => "Proximity to Preferred Person",
        SelfInteraction => "Self-Interaction",
        VerbalPraise => "Verbal interaction/praise",
        SensoryInput => "Sensory input provided",
        CopingStrategyOffered => "Offered coping strategy (e.g., breathing, counting)",
        PhysicalRestraint => "Physical restraint used",
        FollowedBip => "Followed BIP",
        AdditionalSupport => "Staff provided additional support",
        EnvironmentalModification => "Environmental modification",
        PeerSupport => "Peer support provided",
        VisualCues => "Visual cues provided",
        ScheduleAdjustment => "Schedule adjustment",
    }
}

tag_enum! {
    DeliveryMethod, "reinforcer method" {
        Verbal => "verbal",
        Physical => "physical",
        Token => "token",
    }
}

tag_enum! {
    /// Hypothesized function maintaining the behavior.
    BehaviorFunction, "behavior function" {
        Attention => "attention",
        Escape => "escape",
        Tangible => "tangible",
        Sensory => "sensory",
    }
}

/// Every selectable tag, grouped the way the capture form presents them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCatalog {
    pub setting_events: Vec<&'static str>,
    pub target_behaviors: Vec<&'static str>,
    pub replacement_behaviors: Vec<&'static str>,
    pub consequences: Vec<&'static str>,
    pub reinforcer_methods: Vec<&'static str>,
    pub behavior_functions: Vec<&'static str>,
}

pub fn catalog() -> TagCatalog {
    TagCatalog {
        setting_events: SettingEvent::ALL.iter().map(|t| t.as_str()).collect(),
        target_behaviors: TargetBehavior::ALL.iter().map(|t| t.as_str()).collect(),
        replacement_behaviors: ReplacementBehavior::ALL.iter().map(|t| t.as_str()).collect(),
        consequences: Consequence::ALL.iter().map(|t| t.as_str()).collect(),
        reinforcer_methods: DeliveryMethod::ALL.iter().map(|t| t.as_str()).collect(),
        behavior_functions: BehaviorFunction::ALL.iter().map(|t| t.as_str()).collect(),
    }
}
