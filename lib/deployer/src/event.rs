use alloy::{
    rpc::types::{Log, TransactionReceipt},
    sol_types::SolEvent,
};

/// Decodes every log in `logs` that is an `E` event.
pub fn decode_logs<E: SolEvent>(logs: &[Log]) -> impl Iterator<Item = E> + '_ {
    logs.iter()
        .filter_map(|log| log.log_decode::<E>().ok())
        .map(|log| log.inner.data)
}

/// Extension trait for reading the events a transaction emitted.
pub trait Ext<E> {
    /// All emitted events of type `E`, in log order.
    fn events(&self) -> Vec<E>;
}

impl<E> Ext<E> for TransactionReceipt
where
    E: SolEvent,
{
    fn events(&self) -> Vec<E> {
        decode_logs::<E>(self.inner.logs()).collect()
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{address, Address, U256},
        sol,
    };

    use super::*;

    sol! {
        #[derive(Debug, PartialEq)]
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        #[derive(Debug, PartialEq)]
        event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId);
    }

    fn log<E: SolEvent>(event: &E) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn decodes_only_matching_events() {
        let mint = Transfer {
            from: Address::ZERO,
            to: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            tokenId: U256::from(3),
        };
        let approval = Approval {
            owner: mint.to,
            approved: Address::ZERO,
            tokenId: U256::from(3),
        };
        let logs = vec![log(&approval), log(&mint)];

        let transfers: Vec<Transfer> = decode_logs(&logs).collect();
        assert_eq!(transfers, vec![mint]);

        let approvals: Vec<Approval> = decode_logs(&logs).collect();
        assert_eq!(approvals.len(), 1);
    }
}
