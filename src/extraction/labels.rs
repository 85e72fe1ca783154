//! The fixed 13-label vocabulary of the shipping-enquiry tagger.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// A token-level tag. Class ids follow the model's output head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// `O`
    Outside,
    /// `B-Mode_of_transport`
    ModeOfTransport,
    /// `B-Weight`
    Weight,
    /// `B-Weight_unit`
    WeightUnit,
    /// `B-Quantity`
    Quantity,
    /// `B-Package`
    Package,
    /// `B-Port_of_Destination`
    DestinationPortStart,
    /// `I-Port_of_Destination`
    DestinationPortInside,
    /// `B-Cargo_Type`
    CargoType,
    /// `I-Port_of_Loading`
    LoadingPortInside,
    /// `B-Port_of_Loading`
    LoadingPortStart,
    /// `B-Container_status`
    ContainerStatus,
    /// `B-Size`
    Size,
}

impl Label {
    /// All labels in class-id order.
    pub const ALL: [Label; 13] = [
        Label::Outside,
        Label::ModeOfTransport,
        Label::Weight,
        Label::WeightUnit,
        Label::Quantity,
        Label::Package,
        Label::DestinationPortStart,
        Label::DestinationPortInside,
        Label::CargoType,
        Label::LoadingPortInside,
        Label::LoadingPortStart,
        Label::ContainerStatus,
        Label::Size,
    ];

    /// Map a model class id to its label.
    pub fn from_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }

    /// The tag string as emitted by the model config.
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Outside => "O",
            Label::ModeOfTransport => "B-Mode_of_transport",
            Label::Weight => "B-Weight",
            Label::WeightUnit => "B-Weight_unit",
            Label::Quantity => "B-Quantity",
            Label::Package => "B-Package",
            Label::DestinationPortStart => "B-Port_of_Destination",
            Label::DestinationPortInside => "I-Port_of_Destination",
            Label::CargoType => "B-Cargo_Type",
            Label::LoadingPortInside => "I-Port_of_Loading",
            Label::LoadingPortStart => "B-Port_of_Loading",
            Label::ContainerStatus => "B-Container_status",
            Label::Size => "B-Size",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = ModelError;

    /// Accepts the tag name (`B-Weight`) or a generic class name (`LABEL_2`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(label) = Self::ALL.iter().find(|l| l.as_str() == s) {
            return Ok(*label);
        }
        s.strip_prefix("LABEL_")
            .and_then(|id| id.parse::<usize>().ok())
            .and_then(Self::from_id)
            .ok_or_else(|| ModelError::UnknownLabel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_model_head_order() {
        assert_eq!(Label::from_id(0), Some(Label::Outside));
        assert_eq!(Label::from_id(2), Some(Label::Weight));
        assert_eq!(Label::from_id(9), Some(Label::LoadingPortInside));
        assert_eq!(Label::from_id(10), Some(Label::LoadingPortStart));
        assert_eq!(Label::from_id(12), Some(Label::Size));
        assert_eq!(Label::from_id(13), None);
    }

    #[test]
    fn parses_tag_names() {
        for label in Label::ALL {
            assert_eq!(label.as_str().parse::<Label>().unwrap(), label);
        }
    }

    #[test]
    fn parses_generic_class_names() {
        assert_eq!("LABEL_7".parse::<Label>().unwrap(), Label::DestinationPortInside);
        assert_eq!("LABEL_0".parse::<Label>().unwrap(), Label::Outside);
    }

    #[test]
    fn rejects_unknown_labels() {
        assert!(matches!(
            "B-Colour".parse::<Label>(),
            Err(ModelError::UnknownLabel(ref s)) if s == "B-Colour"
        ));
        assert!("LABEL_13".parse::<Label>().is_err());
    }
}
