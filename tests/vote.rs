//! Majority vote tests.

use speaker_gender::{Gender, GenderTally, GenderVerdict};

#[test]
fn empty_tally_is_unknown() {
    let tally = GenderTally::new();
    assert_eq!(tally.verdict(), GenderVerdict::Unknown);
    assert_eq!(tally.most_common(), None);
    assert_eq!(tally.total_votes(), 0);
}

#[test]
fn majority_label_wins() {
    let tally: GenderTally = [Gender::Woman, Gender::Man, Gender::Woman].into_iter().collect();
    assert_eq!(tally.most_common(), Some((Gender::Woman, 2)));
    assert_eq!(tally.votes_for(Gender::Man), 1);
    assert_eq!(tally.total_votes(), 3);
}

#[test]
fn tie_goes_to_first_seen() {
    let man_first: GenderTally = [Gender::Man, Gender::Woman].into_iter().collect();
    assert_eq!(man_first.verdict(), GenderVerdict::Known(Gender::Man));

    let woman_first: GenderTally = [Gender::Woman, Gender::Man, Gender::Man, Gender::Woman]
        .into_iter()
        .collect();
    assert_eq!(woman_first.verdict(), GenderVerdict::Known(Gender::Woman));
}

#[test]
fn failures_do_not_vote() {
    let mut tally = GenderTally::new();
    tally.record_failure();
    tally.record_failure();
    assert_eq!(tally.failures(), 2);
    assert_eq!(tally.verdict(), GenderVerdict::Unknown);

    tally.record(Gender::Man);
    assert_eq!(tally.verdict(), GenderVerdict::Known(Gender::Man));
    assert_eq!(tally.total_votes(), 1);
}

#[test]
fn extend_adds_votes() {
    let mut tally = GenderTally::new();
    tally.record(Gender::Woman);
    tally.extend([Gender::Man, Gender::Man]);
    assert_eq!(tally.verdict(), GenderVerdict::Known(Gender::Man));
}

#[test]
fn verdict_labels() {
    assert_eq!(GenderVerdict::Known(Gender::Man).to_string(), "Man");
    assert_eq!(GenderVerdict::Known(Gender::Woman).label(), "Woman");
    assert_eq!(GenderVerdict::Unknown.to_string(), "Unknown");
    assert!(GenderVerdict::Unknown.is_unknown());
    assert_eq!(GenderVerdict::from(Some(Gender::Woman)).gender(), Some(Gender::Woman));
    assert_eq!(GenderVerdict::from(None), GenderVerdict::Unknown);
}

#[test]
fn gender_parsing() {
    assert_eq!("Man".parse::<Gender>(), Ok(Gender::Man));
    assert_eq!(" female ".parse::<Gender>(), Ok(Gender::Woman));
    assert_eq!("W".parse::<Gender>(), Ok(Gender::Woman));
    assert!("unknown".parse::<Gender>().is_err());
}
