use crux_core::testing::AppTester;
use todo_shared::persistence::encode_items;
use todo_shared::{
    App, Effect, Event, Filter, Model, Theme, TodoDraft, TodoId, ViewModel,
};

fn started() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::AppStarted, &mut model);
    app.update(Event::ItemsLoaded(Ok(None)), &mut model);
    app.update(Event::ThemeLoaded(Ok(None)), &mut model);
    (app, model)
}

fn first_id(view: &ViewModel) -> TodoId {
    view.items[0].id
}

#[test]
fn buy_milk_scenario() {
    let (app, mut model) = started();

    app.update(Event::AddTodo(TodoDraft::new("Buy milk")), &mut model);
    let id = first_id(&app.view(&model));

    let update = app.update(Event::ToggleTodo { id }, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::KeyValue(_))));

    let view = app.view(&model);
    assert_eq!(view.stats.active, 0);
    assert_eq!(view.stats.completed, 1);
    assert_eq!(view.items_left_label, "0 items left");
    assert!(view.show_clear_completed);

    app.update(Event::ClearCompleted, &mut model);
    let view = app.view(&model);
    assert!(view.items.is_empty());
    assert_eq!(view.stats.total, 0);
    assert!(!view.show_clear_completed);
}

#[test]
fn search_narrows_visible_items() {
    let (app, mut model) = started();

    app.update(
        Event::AddTodo(TodoDraft::new("Work task").with_category("work")),
        &mut model,
    );
    app.update(Event::AddTodo(TodoDraft::new("Personal task")), &mut model);
    assert_eq!(app.view(&model).items.len(), 2);

    app.update(Event::SetSearchTerm("work".into()), &mut model);
    let view = app.view(&model);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].text, "Work task");
    // stats ignore the search
    assert_eq!(view.stats.total, 2);
}

#[test]
fn filters_split_active_and_completed() {
    let (app, mut model) = started();
    app.update(Event::AddTodo(TodoDraft::new("Active todo")), &mut model);
    app.update(Event::AddTodo(TodoDraft::new("Completed todo")), &mut model);
    let done = app.view(&model).items[1].id;
    app.update(Event::ToggleTodo { id: done }, &mut model);

    app.update(Event::SetFilter(Filter::Active), &mut model);
    let texts: Vec<String> = app.view(&model).items.into_iter().map(|i| i.text).collect();
    assert_eq!(texts, vec!["Active todo"]);

    app.update(Event::SetFilter(Filter::Completed), &mut model);
    let texts: Vec<String> = app.view(&model).items.into_iter().map(|i| i.text).collect();
    assert_eq!(texts, vec!["Completed todo"]);

    app.update(Event::SetFilter(Filter::All), &mut model);
    assert_eq!(app.view(&model).items.len(), 2);
}

#[test]
fn edit_writes_back_to_the_list() {
    let (app, mut model) = started();
    app.update(Event::AddTodo(TodoDraft::new("Test todo item")), &mut model);
    let id = first_id(&app.view(&model));

    let update = app.update(
        Event::UpdateTodo {
            id,
            text: "Edited test todo item".into(),
        },
        &mut model,
    );

    assert!(update.effects.iter().any(|e| matches!(e, Effect::KeyValue(_))));
    assert_eq!(app.view(&model).items[0].text, "Edited test todo item");
}

#[test]
fn delete_unknown_id_changes_nothing() {
    let (app, mut model) = started();
    app.update(Event::AddTodo(TodoDraft::new("stay")), &mut model);

    let update = app.update(Event::DeleteTodo { id: TodoId(1) }, &mut model);

    assert!(update.effects.is_empty());
    assert_eq!(app.view(&model).items.len(), 1);
}

#[test]
fn reload_restores_items_and_theme() {
    let (app, mut model) = started();
    app.update(Event::AddTodo(TodoDraft::new("Persistent test todo")), &mut model);
    app.update(Event::SetTheme(Theme::Dark), &mut model);

    // what the shell would hand back after a page reload
    let stored_items = encode_items(model.state.items()).unwrap().into_bytes();
    let stored_theme = model.state.theme().as_str().as_bytes().to_vec();

    let mut reloaded = Model::default();
    app.update(Event::AppStarted, &mut reloaded);
    app.update(Event::ItemsLoaded(Ok(Some(stored_items))), &mut reloaded);
    app.update(Event::ThemeLoaded(Ok(Some(stored_theme))), &mut reloaded);

    let view = app.view(&reloaded);
    assert!(view.is_loaded);
    assert_eq!(view.theme, Theme::Dark);
    assert_eq!(reloaded.state.items(), model.state.items());
    assert_eq!(view.items[0].text, "Persistent test todo");
}

#[test]
fn corrupt_storage_starts_fresh() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::ItemsLoaded(Ok(Some(b"not json".to_vec()))), &mut model);
    app.update(Event::ThemeLoaded(Ok(Some(b"sepia".to_vec()))), &mut model);

    let view = app.view(&model);
    assert!(view.items.is_empty());
    assert_eq!(view.theme, Theme::Light);
    assert!(model.is_loaded());

    // the app stays usable
    app.update(Event::AddTodo(TodoDraft::new("fresh start")), &mut model);
    assert_eq!(app.view(&model).items.len(), 1);
}
