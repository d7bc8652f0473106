//! IdGenerator port - トランスポート層のリクエスト ID
//!
//! upload / download の 1 回ごとに RequestId を払い出し、tracing の span に載せます。
//! 時刻部分は Clock から取るので、テストでは FixedClock で固定できます。

use ulid::Ulid;

use crate::domain::RequestId;
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_request_id(&self) -> RequestId;
}

/// Clock の現在時刻（ミリ秒）と 80bit の乱数から ULID を組み立てる
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_request_id(&self) -> RequestId {
        let millis = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        let random: u128 = rand::random::<u128>() & ((1u128 << 80) - 1);
        RequestId::from_ulid(Ulid::from_parts(millis, random))
    }
}
