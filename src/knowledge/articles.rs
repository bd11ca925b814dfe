//! Built-in knowledge base articles, one per probe.

use crate::knowledge::KnowledgeBaseArticle;
use crate::probe::ProbeId;

pub(crate) static ARTICLES: &[KnowledgeBaseArticle] = &[
    KnowledgeBaseArticle {
        id: ProbeId::AVAILABLE_CPUS,
        description: "The runtime on this node detected no usable CPU cores, so the broker cannot schedule work.",
        remediation: "Check CPU quotas and affinity settings for the broker process and its container or VM.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::NETWORK_PARTITION,
        description: "The node has lost contact with at least one cluster peer and the cluster is partitioned.",
        remediation: "Restore network connectivity between nodes, then follow the partition handling strategy (pause_minority or autoheal) or restart the minority side.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::FILE_DESCRIPTOR_THROTTLING,
        description: "File descriptor usage of the broker process is approaching or has reached its limit; new connections and queue files will be refused.",
        remediation: "Raise the open file limit (ulimit -n / LimitNOFILE) for the broker service, or reduce the number of connections and queues.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::SOCKET_DESCRIPTOR_THROTTLING,
        description: "Socket descriptor usage is approaching or has reached the limit; the broker will stop accepting client connections.",
        remediation: "Raise the file descriptor limit, which also bounds sockets, and look for clients that open a connection per operation.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::MEMORY_ALARM,
        description: "The node's memory alarm is in effect and publishing connections are blocked cluster-wide.",
        remediation: "Drain or purge large queues, add consumers, enable lazy or quorum queues, or raise vm_memory_high_watermark if the host has headroom.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::DISK_ALARM,
        description: "Free disk space dropped below disk_free_limit and publishing connections are blocked cluster-wide.",
        remediation: "Free disk space on the data volume, consume backlogged messages, or move the data directory to a larger volume.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::BLOCKED_CONNECTION,
        description: "The connection published while a resource alarm was in effect and is now blocked.",
        remediation: "Resolve the memory or disk alarm that triggered the block; the connection resumes once the alarm clears.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::CHANNEL_LIMIT_REACHED,
        description: "The connection has opened as many channels as its negotiated channel_max allows.",
        remediation: "Reuse channels instead of opening one per operation, close idle channels, or negotiate a higher channel_max.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::CHANNEL_THROTTLING,
        description: "Unacknowledged deliveries on the channel have filled the prefetch window, so the broker has stopped delivering to its consumers.",
        remediation: "Acknowledge messages sooner, add consumers, or increase the channel's prefetch count.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::UNLIMITED_PREFETCH_COUNT,
        description: "The channel has no prefetch limit, so the broker may push an unbounded number of deliveries to a single consumer.",
        remediation: "Set basic.qos with a bounded prefetch count suited to the consumer's processing rate.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::CONSUMER_UTILIZATION,
        description: "Consumers are not able to take deliveries as fast as the queue could hand them out.",
        remediation: "Add consumers, increase their prefetch count, or speed up message acknowledgement.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::QUEUE_GROWTH,
        description: "Messages are arriving faster than they are acknowledged, so the queue is growing.",
        remediation: "Scale out consumers or reduce the publish rate before the backlog triggers a memory alarm.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::QUEUE_HIGH_FLOW,
        description: "The queue has received more messages than the configured high-flow threshold.",
        remediation: "Confirm the traffic is expected; shard hot queues or add consumers if it is sustained.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::QUEUE_LOW_FLOW,
        description: "The queue has received no more messages than the configured low-flow threshold.",
        remediation: "Check that publishers are running and routing to this queue; remove the queue if it is unused.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::QUEUE_NO_FLOW,
        description: "The queue has never received a message.",
        remediation: "Verify bindings and publisher routing keys, or delete the queue if it is obsolete.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::REDELIVERED_MESSAGES,
        description: "A large share of the queue's deliveries are redeliveries, which indicates consumers are rejecting or failing to acknowledge messages.",
        remediation: "Inspect consumer errors, dead-letter poison messages, and avoid requeueing on failure.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::MESSAGE_PAGING,
        description: "The queue has paged messages out to disk because of memory pressure.",
        remediation: "Consume the backlog, use lazy or quorum queues for large backlogs, or add memory to the node.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::HIGH_CONNECTION_CREATION_RATE,
        description: "Clients are opening connections at a high rate, which is expensive for the broker.",
        remediation: "Use long-lived connections and connection pooling in client applications.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::HIGH_CONNECTION_CLOSURE_RATE,
        description: "Clients are closing connections at a high rate, a sign of short-lived connections or clients crashing.",
        remediation: "Use long-lived connections and check client logs for connection errors.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::UNROUTABLE_MESSAGE,
        description: "Messages were published to exchanges with no matching binding and were dropped or returned.",
        remediation: "Fix bindings or routing keys, or configure an alternate exchange to capture unroutable messages.",
    },
    KnowledgeBaseArticle {
        id: ProbeId::RUNTIME_PROCESS_LIMIT,
        description: "The runtime's process table is close to or at its limit; the node will crash when it is exhausted.",
        remediation: "Raise the runtime process limit (+P) or reduce connections, channels and queues, each of which costs processes.",
    },
];
