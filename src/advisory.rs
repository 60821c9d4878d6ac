//! Result labeling and advisory text.
//!
//! Advisory messages and recommendations are presentation policy: a table of
//! `target -> condition -> message` rules evaluated against a
//! [`PredictionBundle`]. Nothing here feeds back into inference.

use crate::models::artifacts::ATTRITION_TARGET;
use crate::types::report::{
    AttritionOutcome, InsightReport, LabeledEstimate, LabeledFlag, PredictionBundle,
    Recommendation,
};

/// Condition a target's value must satisfy for a rule to apply.
///
/// Comparisons are strict: a value equal to the threshold does not satisfy
/// `Above` or `Below`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// Classification flag is set
    FlagSet,
    /// Estimate is strictly greater than the threshold
    Above(f64),
    /// Estimate is strictly less than the threshold
    Below(f64),
}

impl Condition {
    pub fn holds(&self, value: f64) -> bool {
        match *self {
            Condition::FlagSet => value >= 0.5,
            Condition::Above(threshold) => value > threshold,
            Condition::Below(threshold) => value < threshold,
        }
    }
}

/// Picks the advisory message for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryRule {
    pub target: String,
    pub condition: Condition,
    /// Message when the condition holds
    pub when_met: Option<String>,
    /// Message when it does not
    pub otherwise: Option<String>,
}

impl AdvisoryRule {
    pub fn new(target: &str, condition: Condition) -> Self {
        Self {
            target: target.to_string(),
            condition,
            when_met: None,
            otherwise: None,
        }
    }

    pub fn when_met(mut self, message: &str) -> Self {
        self.when_met = Some(message.to_string());
        self
    }

    pub fn otherwise(mut self, message: &str) -> Self {
        self.otherwise = Some(message.to_string());
        self
    }

    fn message(&self, value: f64) -> Option<&str> {
        if self.condition.holds(value) {
            self.when_met.as_deref()
        } else {
            self.otherwise.as_deref()
        }
    }
}

/// A recommendation section included when its target crosses a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRule {
    pub target: String,
    pub condition: Condition,
    pub title: String,
    pub actions: Vec<String>,
}

impl RecommendationRule {
    pub fn new(target: &str, condition: Condition, title: &str, actions: &[&str]) -> Self {
        Self {
            target: target.to_string(),
            condition,
            title: title.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// The full rules table.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryRules {
    advisories: Vec<AdvisoryRule>,
    recommendations: Vec<RecommendationRule>,
}

impl AdvisoryRules {
    pub fn new(advisories: Vec<AdvisoryRule>, recommendations: Vec<RecommendationRule>) -> Self {
        Self {
            advisories,
            recommendations,
        }
    }

    /// Advisory message for `target` at `value`, if a rule covers it.
    pub fn advisory_for(&self, target: &str, value: f64) -> Option<String> {
        self.advisories
            .iter()
            .find(|r| r.target == target)
            .and_then(|r| r.message(value))
            .map(str::to_string)
    }

    /// Recommendation sections triggered by `bundle`, in table order.
    ///
    /// Rules for targets the bundle does not carry never fire.
    pub fn recommendations(&self, bundle: &PredictionBundle) -> Vec<Recommendation> {
        self.recommendations
            .iter()
            .filter(|rule| {
                signal(bundle, &rule.target).is_some_and(|value| rule.condition.holds(value))
            })
            .map(|rule| Recommendation {
                title: rule.title.clone(),
                actions: rule.actions.clone(),
            })
            .collect()
    }
}

/// Numeric view of a target in the bundle; flags map to 1.0 / 0.0.
fn signal(bundle: &PredictionBundle, target: &str) -> Option<f64> {
    let as_f64 = |flag: bool| if flag { 1.0 } else { 0.0 };

    if target == ATTRITION_TARGET {
        return bundle.attrition.map(as_f64);
    }
    bundle
        .flag(target)
        .map(as_f64)
        .or_else(|| bundle.estimate(target))
}

impl Default for AdvisoryRules {
    fn default() -> Self {
        let advisories = vec![
            AdvisoryRule::new("BurnoutRisk", Condition::FlagSet).when_met(
                "Employees with long hours, insufficient rest, and low manager support \
                 are statistically 2.6x more likely to experience burnout, which can reduce \
                 retention and output.",
            ),
            AdvisoryRule::new("NeedsSupport", Condition::FlagSet).when_met(
                "Over 65% of employees facing high stress or low engagement benefit from \
                 structured support programs or counseling access.",
            ),
            AdvisoryRule::new("HighStressFlag", Condition::FlagSet).when_met(
                "High stress is linked to nearly 70% of performance decline. Flagged \
                 employees may face absenteeism or disengagement if not supported.",
            ),
            AdvisoryRule::new("MentalHealthDaysOff", Condition::Above(3.0))
                .when_met(
                    "Employees requiring more than 3 days/month off for mental health fall \
                     into the high-risk zone for burnout and reduced long-term productivity.",
                )
                .otherwise("This estimate falls within a typical healthy range (<= 3 days/month)."),
            AdvisoryRule::new("JobSatisfaction", Condition::Below(5.0))
                .when_met(
                    "Scores below 5 typically indicate dissatisfaction, which correlates with \
                     lower motivation and retention.",
                )
                .otherwise("The employee appears to have fair to good job satisfaction."),
            AdvisoryRule::new("ProductivityScore", Condition::Below(6.0))
                .when_met(
                    "A score below 6 suggests moderate productivity, which may be affected by \
                     engagement or mental health.",
                )
                .otherwise("The employee is likely maintaining a healthy level of productivity."),
            AdvisoryRule::new("WellBeingScore", Condition::Below(7.0))
                .when_met(
                    "Well-being below 7 may require proactive support, as it indicates strain \
                     or low resilience.",
                )
                .otherwise(
                    "This score suggests strong well-being, a protective factor against burnout.",
                ),
            AdvisoryRule::new(ATTRITION_TARGET, Condition::FlagSet)
                .when_met(
                    "Employees predicted as likely to leave often exhibit high stress, low \
                     satisfaction, or limited career growth. Turnover in such cases can cost \
                     30-50% of their annual compensation.",
                )
                .otherwise(
                    "This employee shows low risk of attrition. Continued engagement and growth \
                     support can maintain this stability.",
                ),
        ];

        let recommendations = vec![
            RecommendationRule::new(
                "BurnoutRisk",
                Condition::FlagSet,
                "1. Burnout & Stress",
                &[
                    "Introduce short-term leaves or mental health days.",
                    "Encourage reduction in work hours if over 55/week.",
                    "Offer mindfulness or resilience workshops.",
                ],
            ),
            RecommendationRule::new(
                "NeedsSupport",
                Condition::FlagSet,
                "2. Support & Well-Being",
                &[
                    "Ensure the employee has access to therapy and internal support resources.",
                    "Encourage regular manager 1-on-1 check-ins.",
                    "Promote team bonding or peer-support programs.",
                ],
            ),
            RecommendationRule::new(
                "HighStressFlag",
                Condition::FlagSet,
                "3. High Stress Management",
                &[
                    "Evaluate workload and redistribute tasks if necessary.",
                    "Consider weekly check-ins to monitor mental state.",
                    "Provide access to self-paced de-stress activities.",
                ],
            ),
            RecommendationRule::new(
                "JobSatisfaction",
                Condition::Below(5.0),
                "4. Job Satisfaction & Growth",
                &[
                    "Initiate transparent career development discussions.",
                    "Align work assignments with employee strengths.",
                    "Set short-term goals and recognize achievements.",
                ],
            ),
            RecommendationRule::new(
                "ProductivityScore",
                Condition::Below(6.0),
                "5. Productivity Support",
                &[
                    "Review task complexity and cognitive load.",
                    "Adjust deadlines if necessary to reduce pressure.",
                    "Explore if disengagement is due to work culture or tools.",
                ],
            ),
            RecommendationRule::new(
                "WellBeingScore",
                Condition::Below(7.0),
                "6. Well-Being Support",
                &[
                    "Recommend wellness check-ins or survey feedback.",
                    "Provide optional health sessions or gym vouchers.",
                    "Promote good sleep and exercise habits.",
                ],
            ),
            RecommendationRule::new(
                ATTRITION_TARGET,
                Condition::FlagSet,
                "7. Attrition Risk",
                &[
                    "Have a 1-on-1 conversation about job satisfaction and goals.",
                    "Highlight future opportunities and learning paths.",
                    "Consider mentoring or lateral moves before churn.",
                ],
            ),
        ];

        Self::new(advisories, recommendations)
    }
}

/// Turns a [`PredictionBundle`] into a presentable [`InsightReport`].
#[derive(Debug, Clone, Default)]
pub struct ResultLabeler {
    rules: AdvisoryRules,
}

impl ResultLabeler {
    pub fn new(rules: AdvisoryRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &AdvisoryRules {
        &self.rules
    }

    pub fn label(&self, request_id: String, bundle: &PredictionBundle) -> InsightReport {
        let classifications = bundle
            .classifications
            .iter()
            .map(|flag| LabeledFlag {
                target: flag.target.clone(),
                value: flag.value,
                display: if flag.value { "Yes" } else { "No" }.to_string(),
                advisory: self
                    .rules
                    .advisory_for(&flag.target, if flag.value { 1.0 } else { 0.0 }),
            })
            .collect();

        let regressions = bundle
            .regressions
            .iter()
            .map(|estimate| LabeledEstimate {
                target: estimate.target.clone(),
                value: estimate.value,
                display: format!("{:.2}", estimate.value),
                advisory: self.rules.advisory_for(&estimate.target, estimate.value),
            })
            .collect();

        let attrition = bundle.attrition.map(|leaving| AttritionOutcome {
            likely_to_leave: leaving,
            display: if leaving {
                "Likely to leave"
            } else {
                "Not likely to leave"
            }
            .to_string(),
            advisory: self
                .rules
                .advisory_for(ATTRITION_TARGET, if leaving { 1.0 } else { 0.0 }),
        });

        InsightReport::new(request_id, classifications, regressions, attrition)
            .with_recommendations(self.rules.recommendations(bundle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::report::{TargetEstimate, TargetFlag};

    fn bundle(job_satisfaction: f64, burnout: bool, attrition: Option<bool>) -> PredictionBundle {
        PredictionBundle {
            classifications: vec![
                TargetFlag {
                    target: "BurnoutRisk".into(),
                    value: burnout,
                },
                TargetFlag {
                    target: "NeedsSupport".into(),
                    value: false,
                },
            ],
            regressions: vec![
                TargetEstimate {
                    target: "MentalHealthDaysOff".into(),
                    value: 2.0,
                },
                TargetEstimate {
                    target: "JobSatisfaction".into(),
                    value: job_satisfaction,
                },
            ],
            attrition,
        }
    }

    #[test]
    fn test_threshold_boundary_is_strict() {
        let rules = AdvisoryRules::default();

        let at = rules.advisory_for("JobSatisfaction", 5.0).unwrap();
        assert!(at.contains("fair to good"));

        let below = rules.advisory_for("JobSatisfaction", 4.99).unwrap();
        assert!(below.contains("dissatisfaction"));

        let days_at = rules.advisory_for("MentalHealthDaysOff", 3.0).unwrap();
        assert!(days_at.contains("typical healthy range"));
        let days_above = rules.advisory_for("MentalHealthDaysOff", 3.01).unwrap();
        assert!(days_above.contains("high-risk zone"));
    }

    #[test]
    fn test_flag_advisory_only_when_set() {
        let rules = AdvisoryRules::default();
        assert!(rules.advisory_for("BurnoutRisk", 1.0).is_some());
        assert!(rules.advisory_for("BurnoutRisk", 0.0).is_none());
        assert!(rules.advisory_for("UnknownTarget", 1.0).is_none());
    }

    #[test]
    fn test_label_report() {
        let labeler = ResultLabeler::default();
        let report = labeler.label("req_1".into(), &bundle(4.2, true, Some(true)));

        assert_eq!(report.request_id, "req_1");
        assert_eq!(report.classifications[0].display, "Yes");
        assert!(report.classifications[0].advisory.is_some());
        assert_eq!(report.classifications[1].display, "No");
        assert!(report.classifications[1].advisory.is_none());

        assert_eq!(report.regressions[1].display, "4.20");

        let attrition = report.attrition.unwrap();
        assert_eq!(attrition.display, "Likely to leave");
        assert!(attrition.advisory.unwrap().contains("annual compensation"));

        let titles: Vec<&str> = report
            .recommendations
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec![
                "1. Burnout & Stress",
                "4. Job Satisfaction & Growth",
                "7. Attrition Risk"
            ]
        );
    }

    #[test]
    fn test_missing_targets_never_recommend() {
        let rules = AdvisoryRules::default();
        // no WellBeingScore or ProductivityScore, no attrition model
        let recs = rules.recommendations(&bundle(8.0, false, None));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_custom_rules_table() {
        let rules = AdvisoryRules::new(
            vec![AdvisoryRule::new("JobSatisfaction", Condition::Above(9.0)).when_met("great")],
            vec![RecommendationRule::new(
                "MentalHealthDaysOff",
                Condition::Below(2.5),
                "Keep it up",
                &["Nothing to change."],
            )],
        );
        assert_eq!(rules.advisory_for("JobSatisfaction", 9.5).as_deref(), Some("great"));
        assert_eq!(rules.advisory_for("JobSatisfaction", 9.0), None);

        let recs = rules.recommendations(&bundle(5.0, false, None));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].actions, vec!["Nothing to change."]);
    }
}
