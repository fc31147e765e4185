//! Chainalysis sanctions oracle bindings

use alloy::sol;

sol! {
    /// Chainalysis on-chain sanctions list
    #[sol(rpc)]
    interface ISanctionsList {
        /// Returns true if the address is on the sanctions list
        function isSanctioned(address addr) external view returns (bool);

        /// Emitted when addresses are added to the list
        event SanctionedAddressesAdded(address[] addrs);

        /// Emitted when addresses are removed from the list
        event SanctionedAddressesRemoved(address[] addrs);
    }
}
