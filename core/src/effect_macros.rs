//! Declarative macros for ergonomic effect construction
//!
//! These macros cut the boilerplate of boxing futures when a reducer hands a
//! remote call to the runtime.

/// Create an `Effect::Future` that awaits a fallible call and maps both
/// branches to actions
///
/// Both callbacks return `Option<Action>`; `None` ends the feedback loop.
///
/// # Example
///
/// ```rust,ignore
/// use event_wizard_core::remote_effect;
///
/// remote_effect! {
///     call: remote::create_ticket(backend, draft, event_id),
///     on_success: |ticket| Some(WizardAction::TicketCreated { ticket }),
///     on_error: |error| Some(WizardAction::TicketCreationFailed { error })
/// }
/// ```
#[macro_export]
macro_rules! remote_effect {
    (
        call: $call:expr,
        on_success: |$success_param:ident| $success_body:expr,
        on_error: |$error_param:ident| $error_body:expr
    ) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move {
            match $call.await {
                ::std::result::Result::Ok($success_param) => $success_body,
                ::std::result::Result::Err($error_param) => $error_body,
            }
        }))
    };
}

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use event_wizard_core::async_effect;
///
/// async_effect! {
///     feedback.success("Event created");
///     None
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use event_wizard_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(2),
///     action: WizardAction::DismissNotice
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}
