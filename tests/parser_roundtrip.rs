// tests/parser_roundtrip.rs
//
// The parser contract: total on arbitrary input, and faithful on text that
// follows the prompt template exactly.

use threat_triage::analyze::parser::parse;
use threat_triage::analyze::schema::{RiskLevel, MAX_ANOMALIES};

/// A narrative written exactly in the mandated section format, with known
/// values injected.
fn template_narrative() -> String {
    "\
## Threat Assessment
This email impersonates a bank and pressures the reader to act immediately.

## Red Flags Identified
• Urgency: artificial 24-hour deadline
• Sender mismatch: display name does not match the domain

## Anomaly Detection
**Anomaly Score**: 73
**Detected Anomalies**:
• Lookalike domain with digit substitution
• Generic greeting instead of the account holder's name
• Tracking pixel in the footer
**Behavioral Patterns**: urgency, impersonation, credential harvesting

## Risk Classification
**Risk Level**: HIGH
**Risk Score**: 77
**Risk Category**: Credential Theft
**Risk Factors**:
• Spoofed sender domain
• Link target differs from link text

## Attack Technique
Classic credential phishing: the link leads to a cloned login page.

## Mitigation Recommendations

### Security Strategies
• Enforce MFA: limits the value of stolen credentials
• Add the domain to the blocklist

### Incident Response
• Reset credentials for any user who clicked
• Search mail logs for the same sender

### Policy Alignment
• NIST Cybersecurity Framework: PR.AT, DE.CM
• ISO/IEC 27001: A.8.23
"
    .to_string()
}

#[test]
fn roundtrip_extracts_injected_values() {
    let parsed = parse(&template_narrative());

    assert_eq!(parsed.risk_assessment.level, RiskLevel::High);
    assert_eq!(parsed.risk_assessment.score, 77);
    assert_eq!(parsed.risk_assessment.category, "Credential Theft");
    assert_eq!(
        parsed.risk_assessment.factors,
        vec![
            "Spoofed sender domain",
            "Link target differs from link text"
        ]
    );

    assert_eq!(parsed.anomaly_detection.anomaly_score, 73);
    assert!(parsed.anomaly_detection.has_anomalies);
    assert_eq!(
        parsed.anomaly_detection.anomalies,
        vec![
            "Lookalike domain with digit substitution",
            "Generic greeting instead of the account holder's name",
            "Tracking pixel in the footer"
        ]
    );
    assert_eq!(
        parsed.anomaly_detection.patterns,
        vec!["urgency", "impersonation", "credential harvesting"]
    );

    assert_eq!(
        parsed.mitigation_recommendations.strategies,
        vec![
            "Enforce MFA: limits the value of stolen credentials",
            "Add the domain to the blocklist"
        ]
    );
    assert_eq!(
        parsed.mitigation_recommendations.incident_response,
        vec![
            "Reset credentials for any user who clicked",
            "Search mail logs for the same sender"
        ]
    );
    // Framework references are the fixed baseline, independent of the text.
    assert_eq!(
        parsed.mitigation_recommendations.policy_alignment,
        vec!["NIST CSF", "ISO/IEC 27001", "CIS Controls"]
    );
}

#[test]
fn totality_on_inputs_missing_every_anchor() {
    for input in [
        "",
        "just words",
        "## Unrelated Heading\ncontent",
        "**Bold**: but not an anchor",
        "•••",
        "Risk Level: HIGH without the bold markers",
        "\u{0}\u{1}\u{2} control garbage \u{fffd}",
        "🎣🎣🎣",
    ] {
        let p = parse(input);
        assert_eq!(p.risk_assessment.level, RiskLevel::Medium, "input {input:?}");
        assert_eq!(p.risk_assessment.score, 50);
        assert_eq!(p.risk_assessment.category, "Unknown");
        assert_eq!(p.anomaly_detection.anomaly_score, 0);
        assert!(!p.anomaly_detection.has_anomalies);
        assert!(p.anomaly_detection.anomalies.is_empty());
    }
}

#[test]
fn oversized_anomaly_list_is_truncated_in_order() {
    let mut text = String::from("**Detected Anomalies**:\n");
    for i in 1..=20 {
        text.push_str(&format!("• anomaly number {i}\n"));
    }
    let p = parse(&text);
    assert_eq!(p.anomaly_detection.anomalies.len(), MAX_ANOMALIES);
    assert_eq!(p.anomaly_detection.anomalies[0], "anomaly number 1");
    assert_eq!(
        p.anomaly_detection.anomalies[MAX_ANOMALIES - 1],
        "anomaly number 15"
    );
}

#[test]
fn partial_template_keeps_defaults_for_missing_sections() {
    // Only the risk block is present; everything else stays at defaults.
    let text = "**Risk Level**: LOW\n**Risk Score**: 12\n";
    let p = parse(text);
    assert_eq!(p.risk_assessment.level, RiskLevel::Low);
    assert_eq!(p.risk_assessment.score, 12);
    assert_eq!(p.risk_assessment.category, "Unknown");
    assert!(p.mitigation_recommendations.strategies.is_empty());
    assert_eq!(p.anomaly_detection.anomaly_score, 0);
}
