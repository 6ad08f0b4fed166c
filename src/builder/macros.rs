//! Macros for declaring transition tables.

/// Declare a [`TransitionTable`](crate::core::TransitionTable) in the
/// `name: { from => to, ... }` style.
///
/// Use `*` as the source to declare a wildcard entry. A transition with an
/// empty body is defined but never applicable.
///
/// # Example
///
/// ```
/// use turnstile::transition_table;
///
/// let table = transition_table! {
///     ignite: { parked => idling, stalled => stalled },
///     turn_off: { * => parked },
///     baz: {},
/// };
///
/// assert_eq!(table.len(), 3);
/// assert_eq!(table.destination_for("turn_off", &"idling".into()).unwrap(), "parked");
/// ```
#[macro_export]
macro_rules! transition_table {
    (
        $(
            $name:ident : { $( $from:tt => $to:ident ),* $(,)? }
        ),* $(,)?
    ) => {{
        let mut table = $crate::core::TransitionTable::new();
        $(
            let entries: &[(&str, &str)] = &[ $( (stringify!($from), stringify!($to)) ),* ];
            table.insert(stringify!($name), entries.iter().copied());
        )*
        table
    }};
}
