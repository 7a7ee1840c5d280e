#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use crate::poll::{Poll, VoteError};
    use crate::validation::ValidationError;

    fn poll(options: &[&str]) -> Poll {
        Poll::new(
            "Lunch".into(),
            options.iter().map(|s| s.to_string()).collect(),
            Uuid::new_v4(),
        )
        .unwrap()
    }

    fn conserved(p: &Poll) -> bool {
        p.total_votes() == p.voters.len()
    }

    #[test]
    fn test_option_count_bounds() {
        let make = |n: usize| Poll::new(
            "Lunch".into(),
            (0..n).map(|i| format!("Option {i}")).collect(),
            Uuid::new_v4(),
        );

        assert!(matches!(make(1), Err(ValidationError::TooFewOptions)));
        assert!(matches!(make(6), Err(ValidationError::TooManyOptions)));
        assert!(make(2).is_ok());
        assert!(make(5).is_ok());
    }

    #[test]
    fn test_rejects_empty_text() {
        assert!(matches!(
            Poll::new("".into(), vec!["A".into(), "B".into()], Uuid::new_v4()),
            Err(ValidationError::EmptyTitle)
        ));
        assert!(matches!(
            Poll::new("Lunch".into(), vec!["A".into(), "  ".into()], Uuid::new_v4()),
            Err(ValidationError::EmptyOption)
        ));
    }

    #[test]
    fn test_new_poll_starts_clean() {
        let p = poll(&["Pizza", "Salad"]);
        assert!(p.options.iter().all(|o| o.votes == 0));
        assert!(p.voters.is_empty());
        assert_eq!(p.total_votes(), 0);
    }

    #[test]
    fn test_vote_increments_exactly_one_option() {
        let mut p = poll(&["Pizza", "Salad"]);
        let voter = Uuid::new_v4();

        p.record_vote(voter, 0).unwrap();

        assert_eq!(p.options[0].votes, 1);
        assert_eq!(p.options[1].votes, 0);
        assert!(p.has_voted(&voter));
        assert!(conserved(&p));
    }

    #[test]
    fn test_second_vote_rejected_and_state_unchanged() {
        let mut p = poll(&["Pizza", "Salad"]);
        let voter = Uuid::new_v4();
        p.record_vote(voter, 0).unwrap();

        let before = p.clone();
        assert!(matches!(p.record_vote(voter, 1), Err(VoteError::AlreadyVoted)));
        assert_eq!(p, before);
    }

    #[test]
    fn test_out_of_range_index_rejected_and_state_unchanged() {
        let mut p = poll(&["Pizza", "Salad"]);
        let before = p.clone();

        let n = p.options.len();
        assert!(matches!(p.record_vote(Uuid::new_v4(), n), Err(VoteError::InvalidOption(i)) if i == n));
        assert_eq!(p, before);
    }

    #[test]
    fn test_duplicate_check_runs_before_index_check() {
        let mut p = poll(&["Pizza", "Salad"]);
        let voter = Uuid::new_v4();
        p.record_vote(voter, 0).unwrap();

        // A repeat voter with a bad index still gets the duplicate error.
        assert!(matches!(p.record_vote(voter, 99), Err(VoteError::AlreadyVoted)));
    }

    #[test]
    fn test_conservation_across_many_voters() {
        let mut p = poll(&["A", "B", "C"]);
        for i in 0..30 {
            p.record_vote(Uuid::new_v4(), i % 3).unwrap();
            assert!(conserved(&p));
        }
        assert_eq!(p.total_votes(), 30);
        assert_eq!(p.options[0].votes, 10);
        assert_eq!(p.options[1].votes, 10);
        assert_eq!(p.options[2].votes, 10);
    }

    #[test]
    fn test_summary_projection() {
        let p = poll(&["Pizza", "Salad"]);
        let s = p.summary();
        assert_eq!(s.id, p.id);
        assert_eq!(s.title, p.title);
        assert_eq!(s.created_at, p.created_at);
    }

    #[test]
    fn test_summary_serializes_without_options() {
        let p = poll(&["Pizza", "Salad"]);
        let json = serde_json::to_value(p.summary()).unwrap();
        assert!(json.get("options").is_none());
        assert!(json.get("voters").is_none());
        assert_eq!(json["title"], "Lunch");
    }
}
