// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

use std::time::Duration;

/// Default keyspace prefix for lock providers.
pub(crate) const DEFAULT_LOCK_NAMESPACE: &str = "interlock:lock";

/// Default keyspace prefix for breaker providers.
pub(crate) const DEFAULT_BREAKER_NAMESPACE: &str = "interlock:breaker";

/// Default transport tag under which lock handles are registered.
pub(crate) const DEFAULT_LOCK_TRANSPORT_TAG: &str = "interlock/lock";

/// Default transport tag under which breaker handles are registered.
pub(crate) const DEFAULT_BREAKER_TRANSPORT_TAG: &str = "interlock/breaker";

/// Default total budget for a blocking acquisition.
pub(crate) const DEFAULT_RETRY_TOTAL_TIME: Duration = Duration::from_secs(30);

/// Default sleep between acquisition attempts.
pub(crate) const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(500);
