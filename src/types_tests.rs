//! Tests for core types

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use chrono::Utc;

    #[test]
    fn test_method_serialization() {
        assert_eq!(serde_json::to_string(&Method::Statistical).unwrap(), "\"statistical\"");
        assert_eq!(serde_json::to_string(&Method::Ml).unwrap(), "\"ml\"");
        assert_eq!(serde_json::to_string(&Method::Combined).unwrap(), "\"combined\"");
    }

    #[test]
    fn test_method_deserialization() {
        let ml: Method = serde_json::from_str("\"ml\"").unwrap();
        let combined: Method = serde_json::from_str("\"combined\"").unwrap();
        assert_eq!(ml, Method::Ml);
        assert_eq!(combined, Method::Combined);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("statistical".parse::<Method>().unwrap(), Method::Statistical);
        assert_eq!(" ML ".parse::<Method>().unwrap(), Method::Ml);
        assert_eq!("Combined".parse::<Method>().unwrap(), Method::Combined);
        assert!("average".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_display_matches_label() {
        for method in [Method::Statistical, Method::Ml, Method::Combined] {
            assert_eq!(method.to_string(), method.as_str());
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
    }

    #[test]
    fn test_new_prediction_clamps_confidence() {
        let high = NewPrediction::new(7, 1.4, Method::Ml);
        let low = NewPrediction::new(7, -0.2, Method::Statistical);
        assert_eq!(high.confidence, 1.0);
        assert_eq!(low.confidence, 0.0);
    }

    #[test]
    fn test_prediction_resolution_state() {
        let mut prediction = Prediction {
            id: 1,
            predicted_value: 12,
            confidence: 0.3,
            timestamp: Utc::now(),
            method: Method::Combined,
            actual_value: None,
            correct: None,
        };
        assert!(!prediction.is_resolved());

        prediction.actual_value = Some(40);
        prediction.correct = Some(false);
        assert!(prediction.is_resolved());
    }

    #[test]
    fn test_new_observation_with_draw() {
        let obs = NewObservation::new(33, MANUAL_SOURCE, Utc::now())
            .with_draw(Some("Evening".to_string()), Some("21:00".to_string()));
        assert_eq!(obs.value, 33);
        assert_eq!(obs.source, "manual");
        assert_eq!(obs.draw_name.as_deref(), Some("Evening"));
        assert_eq!(obs.draw_time.as_deref(), Some("21:00"));
    }

    #[test]
    fn test_history_len() {
        let history = History::default();
        assert!(history.is_empty());

        let history = History {
            values: vec![1, 2, 3],
            timestamps: vec![Utc::now(); 3],
        };
        assert_eq!(history.len(), 3);
    }
}
