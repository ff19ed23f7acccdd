mod check;
mod configurations;
mod health;

macros_utils::routes! {
    mod health,
    mod check,
    mod configurations,
}
