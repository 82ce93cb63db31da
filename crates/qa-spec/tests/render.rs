use qa_spec::{
    AnswerStore, AnswerValue, RenderStatus, build_view, progress_bar, render_json_ui, render_text,
    scholarship_form,
};

#[test]
fn first_question_view_has_no_back_action() {
    let spec = scholarship_form();
    let view = build_view(&spec, &AnswerStore::new(), 0);

    assert_eq!(view.status, RenderStatus::NeedInput);
    assert_eq!(view.question.id, "level");
    assert!(view.is_first);
    assert!(!view.is_last);
    assert_eq!(view.progress_fraction(), 0.25);

    let text = render_text(&view);
    assert!(text.contains("What is your level of study?"));
    assert!(text.contains("4. Senior"));
    assert!(!text.contains("[:back]"));
    assert!(text.contains("[Next]"));
}

#[test]
fn selected_option_is_marked() {
    let spec = scholarship_form();
    let mut answers = AnswerStore::new();
    answers.insert("level", AnswerValue::Choice("Junior".into()));
    let text = render_text(&build_view(&spec, &answers, 0));
    assert!(text.contains(" > 3. Junior"));
    assert!(text.contains("   4. Senior"));
}

#[test]
fn last_question_offers_submit() {
    let spec = scholarship_form();
    let view = build_view(&spec, &AnswerStore::new(), 3);
    assert!(view.is_last);
    assert_eq!(view.action_label(), "Submit");
    assert_eq!(view.progress_fraction(), 1.0);
}

#[test]
fn text_question_shows_placeholder_until_answered() {
    let spec = scholarship_form();
    let mut answers = AnswerStore::new();
    let view = build_view(&spec, &answers, 1);
    assert!(render_text(&view).contains("(e.g. Computer Science)"));

    answers.insert("major", AnswerValue::Text("History".into()));
    let view = build_view(&spec, &answers, 1);
    assert!(render_text(&view).contains("  > History"));
}

#[test]
fn json_ui_exposes_progress_and_question() {
    let spec = scholarship_form();
    let mut answers = AnswerStore::new();
    answers.insert("gpa", AnswerValue::Number(3.5));
    let mut view = build_view(&spec, &answers, 2);
    view.error = Some("must be at most 4".into());

    let ui = render_json_ui(&view);
    assert_eq!(ui["form_id"], "scholarship-intake");
    assert_eq!(ui["question"]["id"], "gpa");
    assert_eq!(ui["question"]["type"], "number");
    assert_eq!(ui["question"]["current_value"], 3.5);
    assert_eq!(ui["progress"]["position"], 3);
    assert_eq!(ui["progress"]["fraction"], 0.75);
    assert_eq!(ui["error"], "must be at most 4");
    assert_eq!(ui["action"], "Next");
}

#[test]
fn progress_bar_fills_proportionally() {
    let spec = scholarship_form();
    let view = build_view(&spec, &AnswerStore::new(), 1);
    assert_eq!(progress_bar(&view.progress, 8), "[####----] 2/4");
}
