use alloy::sol;

// Interfaces this tool talks to. The arena registry and the batch contract
// are addressed through configuration; contenders only need `owner()`.
sol! {
    interface IArena {
        function register(address contender) external;
    }

    interface IOwnable {
        function owner() external view returns (address);
    }

    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Aggregate3Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Aggregate3Result[] memory returnData);
    }
}
