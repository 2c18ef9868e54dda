//! 업로드 통계

use std::time::{Duration, Instant};

/// 업로드 통계
#[derive(Debug, Clone)]
pub struct UploadStats {
    /// 시작 시간
    pub start_time: Instant,

    /// 총 패킷 수 (계획)
    pub total_packets: usize,

    /// ACK 받은 데이터 패킷 수
    pub packets_acked: usize,

    /// 전송한 제어 프레임 수
    pub control_frames: usize,

    /// 전송 바이트 (제어 프레임 포함)
    pub bytes_written: u64,

    /// 원본 페이로드 크기
    pub payload_bytes: usize,

    /// ACK 지연 합계
    total_ack_latency: Duration,

    /// 최소 ACK 지연
    pub min_ack_latency: Option<Duration>,

    /// 최대 ACK 지연
    pub max_ack_latency: Option<Duration>,

    /// 완료 시간
    pub finished_at: Option<Instant>,
}

impl UploadStats {
    pub fn new(total_packets: usize, payload_bytes: usize) -> Self {
        Self {
            start_time: Instant::now(),
            total_packets,
            packets_acked: 0,
            control_frames: 0,
            bytes_written: 0,
            payload_bytes,
            total_ack_latency: Duration::ZERO,
            min_ack_latency: None,
            max_ack_latency: None,
            finished_at: None,
        }
    }

    /// 제어 프레임 전송 기록
    pub fn record_control(&mut self, size: usize) {
        self.control_frames += 1;
        self.bytes_written += size as u64;
    }

    /// 데이터 패킷 전송 기록
    pub fn record_packet(&mut self, size: usize) {
        self.bytes_written += size as u64;
    }

    /// ACK 기록
    pub fn record_ack(&mut self, latency: Duration) {
        self.packets_acked += 1;
        self.total_ack_latency += latency;
        self.min_ack_latency = Some(self.min_ack_latency.map_or(latency, |m| m.min(latency)));
        self.max_ack_latency = Some(self.max_ack_latency.map_or(latency, |m| m.max(latency)));
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    /// 경과 시간
    pub fn elapsed(&self) -> Duration {
        self.finished_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.start_time)
    }

    /// 평균 ACK 지연
    pub fn average_ack_latency(&self) -> Option<Duration> {
        if self.packets_acked == 0 {
            return None;
        }
        Some(self.total_ack_latency / self.packets_acked as u32)
    }

    /// 진행률 (0.0 ~ 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_packets == 0 {
            return 0.0;
        }
        self.packets_acked as f64 / self.total_packets as f64
    }

    /// 페이로드 처리량 (bytes/sec)
    pub fn throughput(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.payload_bytes as f64 / elapsed
        } else {
            0.0
        }
    }

    /// 요약 문자열
    pub fn summary(&self) -> String {
        format!(
            "Packets: {}/{}, Control frames: {}, Written: {} bytes, Elapsed: {:.2}s, \
             ACK avg: {:.1}ms, Throughput: {:.0} B/s",
            self.packets_acked,
            self.total_packets,
            self.control_frames,
            self.bytes_written,
            self.elapsed().as_secs_f64(),
            self.average_ack_latency()
                .map(|d| d.as_secs_f64() * 1000.0)
                .unwrap_or(0.0),
            self.throughput()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_latency_tracking() {
        let mut stats = UploadStats::new(4, 700);
        assert_eq!(stats.average_ack_latency(), None);

        stats.record_ack(Duration::from_millis(10));
        stats.record_ack(Duration::from_millis(30));

        assert_eq!(stats.packets_acked, 2);
        assert_eq!(stats.min_ack_latency, Some(Duration::from_millis(10)));
        assert_eq!(stats.max_ack_latency, Some(Duration::from_millis(30)));
        assert_eq!(stats.average_ack_latency(), Some(Duration::from_millis(20)));
        assert!((stats.progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bytes_and_summary() {
        let mut stats = UploadStats::new(1, 196);
        stats.record_control(16);
        stats.record_control(16);
        stats.record_packet(243);
        stats.record_ack(Duration::from_millis(5));
        stats.finish();

        assert_eq!(stats.control_frames, 2);
        assert_eq!(stats.bytes_written, 275);

        let summary = stats.summary();
        assert!(summary.contains("Packets: 1/1"));
        assert!(summary.contains("Control frames: 2"));
    }
}
