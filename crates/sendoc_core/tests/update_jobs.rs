use sendoc_core::{
    update, AppState, BrowseView, DetailView, Effect, JobDetail, JobQuery, JobSummary, Msg,
};

fn listing(id: &str, city: &str, state: &str) -> JobSummary {
    JobSummary {
        job_id: id.to_string(),
        title: format!("Listing {id}"),
        city: city.to_string(),
        state: state.to_string(),
        ..JobSummary::default()
    }
}

#[test]
fn browse_emits_load_effect_and_shows_cards_in_order() {
    let query = JobQuery::all().with("profession", "CRNA");
    let (mut state, effects) = update(AppState::new(), Msg::BrowseRequested(query.clone()));
    assert_eq!(effects, vec![Effect::LoadJobs { query }]);
    assert_eq!(state.view().browse, BrowseView::Loading);
    assert!(state.consume_dirty());

    let (mut state, _) = update(
        state,
        Msg::JobsListed(vec![listing("B", "Chicago", "IL"), listing("A", "Pittsburgh", "PA")]),
    );
    match state.view().browse {
        BrowseView::Cards(cards) => {
            let ids: Vec<_> = cards.iter().map(|card| card.job_id.as_str()).collect();
            assert_eq!(ids, vec!["B", "A"]);
            assert_eq!(cards[1].location, "Pittsburgh, PA");
        }
        other => panic!("unexpected browse view {other:?}"),
    }
    assert!(state.consume_dirty());
}

#[test]
fn empty_and_unavailable_results_degrade() {
    let (state, _) = update(AppState::new(), Msg::BrowseRequested(JobQuery::all()));
    let (state, _) = update(state, Msg::JobsListed(Vec::new()));
    assert_eq!(state.view().browse, BrowseView::Empty);

    let (state, _) = update(
        state,
        Msg::JobsUnavailable {
            reason: "dns".into(),
        },
    );
    assert_eq!(state.view().browse, BrowseView::Unavailable);
}

#[test]
fn detail_loads_or_reports_not_found() {
    let (state, effects) = update(
        AppState::new(),
        Msg::JobDetailRequested {
            job_id: "JO-1".into(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::LoadJobDetail {
            job_id: "JO-1".into()
        }]
    );

    let (state, _) = update(
        state,
        Msg::JobNotFound {
            job_id: "JO-1".into(),
        },
    );
    assert_eq!(
        state.view().detail,
        DetailView::NotFound {
            job_id: "JO-1".into()
        }
    );

    let (state, _) = update(
        state,
        Msg::JobDetailRequested {
            job_id: "JO-2".into(),
        },
    );
    let detail = JobDetail {
        summary: listing("JO-2", "Charleston", "WV"),
        description: Some("Regional referral center".into()),
        ..JobDetail::default()
    };
    let (state, _) = update(
        state,
        Msg::JobDetailLoaded {
            job_id: "JO-2".into(),
            detail: detail.clone(),
        },
    );
    assert_eq!(state.view().detail, DetailView::Loaded(detail));
}

#[test]
fn detail_is_shown_when_backend_spells_id_differently() {
    let (state, _) = update(
        AppState::new(),
        Msg::JobDetailRequested {
            job_id: "jo-10145".into(),
        },
    );
    let detail = JobDetail {
        summary: listing("JO-10145", "Denver", "CO"),
        ..JobDetail::default()
    };
    let (state, _) = update(
        state,
        Msg::JobDetailLoaded {
            job_id: "jo-10145".into(),
            detail: detail.clone(),
        },
    );
    assert_eq!(state.view().detail, DetailView::Loaded(detail));
}

#[test]
fn stale_detail_answers_are_dropped() {
    let (state, _) = update(
        AppState::new(),
        Msg::JobDetailRequested {
            job_id: "new".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::JobDetailLoaded {
            job_id: "old".into(),
            detail: JobDetail {
                summary: listing("new", "", ""),
                ..JobDetail::default()
            },
        },
    );
    assert_eq!(
        state.view().detail,
        DetailView::Loading {
            job_id: "new".into()
        }
    );
}

#[test]
fn blank_detail_id_is_ignored() {
    let (state, effects) = update(
        AppState::new(),
        Msg::JobDetailRequested {
            job_id: "  ".into(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().detail, DetailView::Closed);
}
