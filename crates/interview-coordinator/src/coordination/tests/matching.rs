use super::common::*;
use std::sync::Arc;

use crate::coordination::directory::{Interviewer, InterviewerRole, StaticDirectory};
use crate::coordination::domain::{ApplicantBackground, InterviewType};
use crate::coordination::matching::{
    InterviewerMatcher, MatchCriteria, MatchFactor, MatchWeights, MatchingError,
};
use crate::coordination::memory::InMemoryInterviewStore;
use crate::coordination::repository::InterviewRepository;

fn matcher(
    interviewers: Vec<Interviewer>,
) -> (
    InterviewerMatcher<StaticDirectory, InMemoryInterviewStore>,
    Arc<InMemoryInterviewStore>,
) {
    let store = Arc::new(InMemoryInterviewStore::default());
    let matcher = InterviewerMatcher::new(
        Arc::new(StaticDirectory::new(interviewers)),
        store.clone(),
        MatchWeights::default(),
    );
    (matcher, store)
}

fn screening() -> MatchCriteria {
    MatchCriteria::new(InterviewType::InitialScreening, ApplicantBackground::default())
}

#[test]
fn best_match_prefers_primary_role_competencies_and_alignment() {
    let (matcher, _) = matcher(full_roster());

    let best = matcher.find_best_match(&screening()).expect("match found");

    assert_eq!(best.interviewer_id.0, "iv-officer-a");
    assert!((best.score - 86.0).abs() < 0.01, "score was {}", best.score);
    assert!(best
        .reasons
        .iter()
        .any(|reason| reason.contains("primary role")));
    assert_eq!(best.components.len(), MatchFactor::ordered().len());
}

#[test]
fn secondary_roles_rank_below_primary_roles() {
    let (matcher, _) = matcher(full_roster());

    let ranked = matcher.rank(&screening()).expect("ranking");
    let ids: Vec<&str> = ranked.iter().map(|m| m.interviewer_id.0.as_str()).collect();

    assert_eq!(ids, vec!["iv-officer-a", "iv-officer-b", "iv-admin"]);
    assert!((ranked[1].score - 69.0).abs() < 0.01);
    assert!((ranked[2].score - 41.0).abs() < 0.01);
}

#[test]
fn equal_scores_break_on_alignment_then_id() {
    let weights = MatchWeights {
        alignment: 0.0,
        ..MatchWeights::default()
    };
    let interviewers = vec![
        Interviewer {
            alignment: Some(0.4),
            ..interviewer("iv-a", InterviewerRole::AdmissionsOfficer)
        },
        Interviewer {
            alignment: Some(0.9),
            ..interviewer("iv-b", InterviewerRole::AdmissionsOfficer)
        },
        Interviewer {
            alignment: Some(0.4),
            ..interviewer("iv-0", InterviewerRole::AdmissionsOfficer)
        },
    ];
    let matcher = InterviewerMatcher::new(
        Arc::new(StaticDirectory::new(interviewers)),
        Arc::new(InMemoryInterviewStore::default()),
        weights,
    );

    let ranked = matcher.rank(&screening()).expect("ranking");
    let ids: Vec<&str> = ranked.iter().map(|m| m.interviewer_id.0.as_str()).collect();

    assert_eq!(ranked[0].score, ranked[1].score);
    assert_eq!(ranked[1].score, ranked[2].score);
    assert_eq!(ids, vec!["iv-b", "iv-0", "iv-a"]);
}

#[test]
fn multiple_matches_are_non_increasing_and_capped_at_pool() {
    let (matcher, _) = matcher(full_roster());
    let criteria = MatchCriteria::new(InterviewType::CommitteeInterview, ApplicantBackground::default());

    let all = matcher
        .find_multiple_matches(&criteria, 50)
        .expect("committee pool");
    assert_eq!(all.len(), 4, "dean, faculty, chaplain and administrator");
    assert!(all.windows(2).all(|pair| pair[0].score >= pair[1].score));

    let top_two = matcher
        .find_multiple_matches(&criteria, 2)
        .expect("committee pair");
    assert_eq!(top_two.len(), 2);
    assert_eq!(top_two[0].interviewer_id, all[0].interviewer_id);
}

#[test]
fn empty_directory_yields_no_eligible_interviewers() {
    let (matcher, _) = matcher(vec![interviewer("iv-faculty", InterviewerRole::Faculty)]);

    match matcher.find_best_match(&screening()) {
        Err(MatchingError::NoEligibleInterviewers(InterviewType::InitialScreening)) => {}
        other => panic!("expected no eligible interviewers, got {other:?}"),
    }
}

#[test]
fn inactive_interviewers_are_never_ranked() {
    let inactive = Interviewer {
        active: false,
        ..lead_officer()
    };
    let (matcher, _) = matcher(vec![inactive, second_officer()]);

    let ranked = matcher.rank(&screening()).expect("ranking");
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].interviewer_id.0, "iv-officer-b");
}

#[test]
fn booked_interviewers_are_excluded_for_a_target_time() {
    let (matcher, store) = matcher(vec![lead_officer(), second_officer()]);
    store
        .insert(booked("int-busy", "iv-officer-a", at(10, 14, 0), 30))
        .expect("seed booking");

    let criteria = MatchCriteria {
        scheduled_at: Some(at(10, 14, 15)),
        ..screening()
    };
    let best = matcher.find_best_match(&criteria).expect("fallback match");
    assert_eq!(best.interviewer_id.0, "iv-officer-b");

    let later = MatchCriteria {
        scheduled_at: Some(at(10, 14, 30)),
        ..screening()
    };
    let best = matcher.find_best_match(&later).expect("adjacent slot free");
    assert_eq!(best.interviewer_id.0, "iv-officer-a");
}

#[test]
fn fully_booked_pool_reports_no_available_slot() {
    let (matcher, store) = matcher(vec![lead_officer()]);
    store
        .insert(booked("int-busy", "iv-officer-a", at(10, 14, 0), 60))
        .expect("seed booking");

    let criteria = MatchCriteria {
        scheduled_at: Some(at(10, 14, 0)),
        ..screening()
    };
    match matcher.find_best_match(&criteria) {
        Err(MatchingError::NoAvailableSlot { .. }) => {}
        other => panic!("expected no available slot, got {other:?}"),
    }
}

#[test]
fn language_and_culture_preferences_raise_scores() {
    let (matcher, _) = matcher(vec![lead_officer(), second_officer()]);
    let background = ApplicantBackground {
        language_preference: Some("spanish".to_string()),
        cultural_background: Some("Latin American".to_string()),
        ..ApplicantBackground::default()
    };
    let criteria = MatchCriteria::new(InterviewType::InitialScreening, background);

    let ranked = matcher.rank(&criteria).expect("ranking");
    let lead = &ranked[0];
    assert_eq!(lead.interviewer_id.0, "iv-officer-a");
    assert!(lead
        .reasons
        .iter()
        .any(|reason| reason.contains("language 'spanish'")));

    let language = ranked[1]
        .components
        .iter()
        .find(|component| component.factor == MatchFactor::Language)
        .expect("language component");
    assert_eq!(language.value, 0.0);
}

#[test]
fn focus_areas_extend_the_competency_overlap() {
    let faculty = Interviewer {
        competencies: vec!["Curriculum".to_string(), "Biblical Languages".to_string()],
        ..interviewer("iv-faculty-a", InterviewerRole::Faculty)
    };
    let generalist = Interviewer {
        competencies: vec!["Curriculum".to_string()],
        ..interviewer("iv-faculty-b", InterviewerRole::Faculty)
    };
    let (matcher, _) = matcher(vec![generalist, faculty]);
    let background = ApplicantBackground {
        focus_areas: vec!["biblical languages".to_string()],
        ..ApplicantBackground::default()
    };
    let criteria = MatchCriteria::new(InterviewType::AcademicAssessment, background);

    let best = matcher.find_best_match(&criteria).expect("match");
    assert_eq!(best.interviewer_id.0, "iv-faculty-a");
}
