use super::*;

fn sample_analysis() -> ClaimAnalysis {
    ClaimAnalysis {
        claim: "The bridge collapsed this morning".to_string(),
        final_verdict: Verdict::False,
        confidence: 0.85,
        explanation: "Officials confirmed the bridge is intact.".to_string(),
        backend_verdicts: vec![BackendVerdict {
            backend_name: "gemini-2.0-flash".to_string(),
            verdict: Verdict::False,
            confidence: 0.85,
            reasoning: "Police denied the report.".to_string(),
        }],
        sources: vec![Evidence {
            title: "Police clarification".to_string(),
            url: "https://police.gov.in/notice".to_string(),
            snippet: "The bridge is safe.".to_string(),
            credibility: Credibility::High,
        }],
        analyzed_at: Utc::now(),
        cached: false,
    }
}

#[test]
fn test_verdict_serializes_uppercase() {
    assert_eq!(serde_json::to_string(&Verdict::Misleading).unwrap(), "\"MISLEADING\"");
    assert_eq!(
        serde_json::from_str::<Verdict>("\"UNVERIFIED\"").unwrap(),
        Verdict::Unverified
    );
}

#[test]
fn test_verdict_rejects_unknown_json_value() {
    assert!(serde_json::from_str::<Verdict>("\"MAYBE\"").is_err());
}

#[test]
fn test_verdict_from_str_is_case_insensitive() {
    assert_eq!(" true ".parse::<Verdict>(), Ok(Verdict::True));
    assert_eq!("False".parse::<Verdict>(), Ok(Verdict::False));
    assert!("mostly true".parse::<Verdict>().is_err());
}

#[test]
fn test_verdict_display_matches_as_str() {
    for verdict in Verdict::ALL {
        assert_eq!(verdict.to_string(), verdict.as_str());
    }
}

#[test]
fn test_credibility_order() {
    let mut tiers = vec![Credibility::Low, Credibility::High, Credibility::Medium];
    tiers.sort();
    assert_eq!(
        tiers,
        vec![Credibility::High, Credibility::Medium, Credibility::Low]
    );
}

#[test]
fn test_credibility_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Credibility::High).unwrap(), "\"high\"");
}

#[test]
fn test_unverified_constructor() {
    let analysis = ClaimAnalysis::unverified("claim", "no evidence");

    assert_eq!(analysis.final_verdict, Verdict::Unverified);
    assert_eq!(analysis.confidence, 0.0);
    assert!(analysis.backend_verdicts.is_empty());
    assert!(analysis.sources.is_empty());
    assert!(!analysis.cached);
}

#[test]
fn test_analysis_json_shape() {
    let value = serde_json::to_value(sample_analysis()).unwrap();

    assert_eq!(value["final_verdict"], "FALSE");
    assert_eq!(value["sources"][0]["credibility"], "high");
    assert_eq!(value["backend_verdicts"][0]["backend_name"], "gemini-2.0-flash");
    assert_eq!(value["cached"], false);
}

#[test]
fn test_analysis_json_missing_optional_fields() {
    let json = serde_json::json!({
        "claim": "x",
        "final_verdict": "TRUE",
        "confidence": 0.5,
        "explanation": "y",
        "analyzed_at": "2025-12-09T09:38:00Z"
    });

    let analysis: ClaimAnalysis = serde_json::from_value(json).unwrap();
    assert!(analysis.backend_verdicts.is_empty());
    assert!(!analysis.cached);
}

#[test]
fn test_analysis_request_url_optional() {
    let req: AnalysisRequest = serde_json::from_str(r#"{"claim":"abc"}"#).unwrap();
    assert_eq!(req.claim, "abc");
    assert!(req.url.is_none());
}
